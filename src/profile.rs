//! Builds one [`FinancialProfile`] per account/source and folds several of
//! them into one [`ApplicationFinancialProfile`] per applicant.

use crate::balance::{balance_stats, ledger_balance_series, reconstruct_daily_balances, BalanceStats};
use crate::catalog::EntityCatalogs;
use crate::detector::{detect_card_settlements, detect_repayments, match_lender, push_canonical, LenderMatch};
use crate::error::ProfileError;
use crate::normalizer::normalize_records;
use crate::schema::{AccountData, ApplicationFinancialProfile, FinancialProfile, Transaction};
use crate::utils::{transaction_span_days, transaction_span_divisor};
use log::{debug, warn};

const TRANSFER_TERMS: &[&str] = &["transfer", "tfr", "sweep"];
const REFUND_TERMS: &[&str] = &["refund", "reversal", "returned"];
const OPENING_BALANCE_TERMS: &[&str] = &["opening balance", "balance brought forward", "bbf"];

/// A round credit of at least this much from a known lender is treated as a
/// loan drawdown, not income.
const DRAWDOWN_MIN_AMOUNT: f64 = 1000.0;
const DRAWDOWN_ROUND_STEP: f64 = 100.0;

pub struct ProfileBuilder<'a> {
    catalogs: &'a EntityCatalogs,
    window_days: usize,
}

impl<'a> ProfileBuilder<'a> {
    pub fn new(catalogs: &'a EntityCatalogs, window_days: usize) -> Self {
        Self {
            catalogs,
            window_days,
        }
    }

    /// Computes one profile for one account's raw records.
    ///
    /// Zero parsable transactions is not an error: "no activity detected" is
    /// a valid, reportable outcome and yields an all-zero profile.
    pub fn build(&self, account: &AccountData) -> FinancialProfile {
        let currency_code = account
            .currency_code
            .clone()
            .unwrap_or_else(|| "GBP".to_string());

        let mut transactions =
            normalize_records(&account.transactions, account.sign_convention);

        if transactions.is_empty() {
            debug!("No parsable transactions for account; returning empty profile");
            return FinancialProfile {
                currency_code,
                ..FinancialProfile::default()
            };
        }

        transactions.sort_by_key(|t| t.date);

        // One divisor per profile; every "average monthly" figure reuses it.
        let months = transaction_span_divisor(&transactions);

        let account_name = account.account_name.as_deref();
        let income_sum: f64 = transactions
            .iter()
            .filter(|t| t.amount > 0.0)
            .filter(|t| !self.is_excluded_inflow(t, account_name))
            .map(|t| t.amount)
            .sum();

        let stats = self.balance_statistics(account, &transactions);
        let repayments = detect_repayments(&transactions, &self.catalogs.lenders);
        let cards = detect_card_settlements(&transactions, &self.catalogs.card_processors);

        FinancialProfile {
            average_monthly_income: income_sum / months,
            average_eod_balance: stats.average,
            low_balance_day_count: stats.low_balance_days,
            negative_balance_day_count: stats.negative_balance_days,
            average_monthly_card_turnover: cards.total_inflow / months,
            detected_card_providers: cards.providers,
            detected_repayments: repayments,
            currency_code,
        }
    }

    /// A ledger balance column wins when the statement has one; otherwise the
    /// series is reconstructed backward from the current balance over the
    /// observed span (capped at the configured window). With neither source
    /// the balance-dependent fields stay zero.
    fn balance_statistics(&self, account: &AccountData, transactions: &[Transaction]) -> BalanceStats {
        let ledger = ledger_balance_series(transactions);
        if !ledger.is_empty() {
            return balance_stats(&ledger);
        }

        let anchor = match transactions.iter().map(|t| t.date).max() {
            Some(date) => date,
            None => return BalanceStats::default(),
        };
        let window = self.window_days.min(transaction_span_days(transactions).max(1));

        match reconstruct_daily_balances(account.current_balance, transactions, window, anchor) {
            Ok(series) => balance_stats(&series),
            Err(ProfileError::InsufficientBalanceData) => {
                debug!("No ledger column and no current balance; balance fields zeroed");
                BalanceStats::default()
            }
            Err(err) => {
                warn!("Balance reconstruction failed: {}", err);
                BalanceStats::default()
            }
        }
    }

    fn is_excluded_inflow(&self, txn: &Transaction, account_name: Option<&str>) -> bool {
        let description = txn.description.trim().to_lowercase();

        if TRANSFER_TERMS.iter().any(|t| description.contains(t)) {
            return true;
        }
        if REFUND_TERMS.iter().any(|t| description.contains(t)) {
            return true;
        }
        if OPENING_BALANCE_TERMS.iter().any(|t| description.contains(t)) {
            return true;
        }

        // Credits that echo the account's own name are internal movements.
        if let Some(name) = account_name {
            let name = name.trim().to_lowercase();
            if name.len() >= 4 && description.contains(&name) {
                return true;
            }
        }

        // A large round-sum credit from a known lender is a payout, not income.
        if matches!(
            match_lender(&txn.description, &self.catalogs.lenders),
            LenderMatch::Specific(_)
        ) && txn.amount >= DRAWDOWN_MIN_AMOUNT
            && is_round_multiple(txn.amount, DRAWDOWN_ROUND_STEP)
        {
            return true;
        }

        false
    }
}

fn is_round_multiple(amount: f64, step: f64) -> bool {
    let quotient = amount / step;
    (quotient - quotient.round()).abs() < 1e-6
}

/// Folds per-account profiles into one application-level profile.
///
/// Repayment counts and totals sum; lender and provider sets union; the
/// `average_*` fields and day counts take the arithmetic mean, treating each
/// profile as a comparable observation period. Currency comes from the first
/// contributing profile.
pub fn aggregate_profiles(profiles: &[FinancialProfile]) -> ApplicationFinancialProfile {
    if profiles.is_empty() {
        return ApplicationFinancialProfile::default();
    }

    let n = profiles.len() as f64;
    let mut aggregate = ApplicationFinancialProfile {
        currency_code: profiles[0].currency_code.clone(),
        ..ApplicationFinancialProfile::default()
    };

    let mut low_days_sum = 0usize;
    let mut negative_days_sum = 0usize;

    for profile in profiles {
        aggregate.average_monthly_income += profile.average_monthly_income;
        aggregate.average_eod_balance += profile.average_eod_balance;
        aggregate.average_monthly_card_turnover += profile.average_monthly_card_turnover;
        low_days_sum += profile.low_balance_day_count;
        negative_days_sum += profile.negative_balance_day_count;

        aggregate.detected_repayments.count += profile.detected_repayments.count;
        aggregate.detected_repayments.total_amount += profile.detected_repayments.total_amount;
        for lender in &profile.detected_repayments.lenders {
            push_canonical(&mut aggregate.detected_repayments.lenders, lender);
        }
        for provider in &profile.detected_card_providers {
            push_canonical(&mut aggregate.detected_card_providers, provider);
        }
    }

    aggregate.average_monthly_income /= n;
    aggregate.average_eod_balance /= n;
    aggregate.average_monthly_card_turnover /= n;
    aggregate.low_balance_day_count = (low_days_sum as f64 / n).round() as usize;
    aggregate.negative_balance_day_count = (negative_days_sum as f64 / n).round() as usize;

    aggregate
}
