//! Derives end-of-day balance series. Two sources exist: a ledger balance
//! column supplied by the statement, or reconstruction backward from a known
//! current balance. Both feed the same statistics.

use crate::error::{ProfileError, Result};
use crate::schema::{DailyBalancePoint, Transaction};
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

/// End-of-day balances below this are counted as "low balance" days.
pub const LOW_BALANCE_THRESHOLD: f64 = 300.0;

/// Reconstructs a trailing end-of-day balance series from a known current
/// balance and a transaction list.
///
/// `anchor` is day 0 (today or the last known date) and carries the given
/// current balance. Walking backward, the series records the running value
/// for each day and then removes that day's net flow, so the value one day
/// earlier is the end-of-day balance before those transactions happened.
/// Days without transactions carry the balance unchanged, so the result has
/// exactly `window_days` contiguous points, **newest first**.
///
/// Fails with [`ProfileError::InsufficientBalanceData`] when no current
/// balance is known; zero is never assumed.
pub fn reconstruct_daily_balances(
    current_balance: Option<f64>,
    transactions: &[Transaction],
    window_days: usize,
    anchor: NaiveDate,
) -> Result<Vec<DailyBalancePoint>> {
    let balance = current_balance.ok_or(ProfileError::InsufficientBalanceData)?;

    let mut net_by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for txn in transactions {
        *net_by_date.entry(txn.date).or_insert(0.0) += txn.amount;
    }

    let mut series = Vec::with_capacity(window_days);
    let mut running = balance;

    for offset in 0..window_days {
        let date = anchor
            .checked_sub_days(Days::new(offset as u64))
            .ok_or_else(|| {
                ProfileError::DateError(format!("Window underflows the calendar at {}", anchor))
            })?;

        series.push(DailyBalancePoint {
            date,
            balance: running,
        });

        // Amounts are normalized to "positive = in", so stepping back in
        // time removes the day's net inflow.
        if let Some(net) = net_by_date.get(&date) {
            running -= net;
        }
    }

    Ok(series)
}

/// Collects the ledger balance column into one point per day, taking the
/// last balance seen on each date. Points exist only for days the statement
/// actually shows; the result is ordered oldest first.
pub fn ledger_balance_series(transactions: &[Transaction]) -> Vec<DailyBalancePoint> {
    let mut sorted: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.running_balance.is_some())
        .collect();
    sorted.sort_by_key(|t| t.date);

    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for txn in sorted {
        if let Some(balance) = txn.running_balance {
            by_date.insert(txn.date, balance);
        }
    }

    by_date
        .into_iter()
        .map(|(date, balance)| DailyBalancePoint { date, balance })
        .collect()
}

/// Mean and low/negative day counts over a balance series. An empty series
/// yields all zeros; "no balance data" is a valid, reportable outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BalanceStats {
    pub average: f64,
    pub low_balance_days: usize,
    pub negative_balance_days: usize,
}

pub fn balance_stats(series: &[DailyBalancePoint]) -> BalanceStats {
    if series.is_empty() {
        return BalanceStats::default();
    }

    let sum: f64 = series.iter().map(|p| p.balance).sum();

    BalanceStats {
        average: sum / series.len() as f64,
        low_balance_days: series
            .iter()
            .filter(|p| p.balance < LOW_BALANCE_THRESHOLD)
            .count(),
        negative_balance_days: series.iter().filter(|p| p.balance < 0.0).count(),
    }
}
