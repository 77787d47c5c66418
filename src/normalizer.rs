//! Converts heterogeneous source records into the canonical [`Transaction`]
//! shape. Every ingestion path (statement extraction, open-banking feed)
//! funnels through here before any analysis runs.

use crate::error::{ProfileError, Result};
use crate::schema::{RawTransactionRecord, SignConvention, Transaction};
use chrono::NaiveDate;
use log::warn;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d %b %Y", "%d %B %Y"];

/// Trailing markers that force a value negative (bank "debit suffix" notation).
const DEBIT_SUFFIXES: &[&str] = &["DEBIT", "DR", "OD", "D"];

/// Normalizes a batch of raw records under the declared sign convention.
///
/// Output amounts always mean "positive = money in". Records whose date or
/// amount cannot be parsed are logged and skipped; the batch never aborts.
pub fn normalize_records(
    records: &[RawTransactionRecord],
    convention: SignConvention,
) -> Vec<Transaction> {
    let mut transactions = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match normalize_record(record, convention, index) {
            Ok(txn) => transactions.push(txn),
            Err(err) => warn!("Skipping record: {}", err),
        }
    }

    transactions
}

fn normalize_record(
    record: &RawTransactionRecord,
    convention: SignConvention,
    index: usize,
) -> Result<Transaction> {
    let date = parse_date(&record.date).map_err(|e| ProfileError::MalformedRecord {
        index,
        details: e.to_string(),
    })?;

    let mut amount = parse_amount(&record.amount).map_err(|e| ProfileError::MalformedRecord {
        index,
        details: e.to_string(),
    })?;

    if convention == SignConvention::OutflowPositive {
        amount = -amount;
    }

    // A ledger balance is a snapshot, not a flow: it keeps its own sign and
    // an unparsable value drops the balance, not the whole record.
    let running_balance = match &record.running_balance {
        Some(raw) => match parse_amount(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Dropping unparsable ledger balance at index {}: {}", index, err);
                None
            }
        },
        None => None,
    };

    Ok(Transaction {
        date,
        description: record.description.trim().to_string(),
        amount,
        running_balance,
    })
}

/// Parses a calendar date, trying the formats banks actually emit.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(ProfileError::DateError(format!(
        "Unrecognized date '{}'",
        raw
    )))
}

/// Coerces a monetary string to a signed decimal.
///
/// Strips currency symbols, thousands separators and whitespace. A value
/// wrapped in parentheses or carrying a trailing debit marker (D, DR, DEBIT,
/// OD) is forced negative.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let mut text = raw.trim().to_string();
    let mut force_negative = false;

    if text.starts_with('(') && text.ends_with(')') {
        force_negative = true;
        text = text[1..text.len() - 1].trim().to_string();
    }

    let upper = text.to_uppercase();
    for suffix in DEBIT_SUFFIXES {
        if upper.ends_with(suffix) {
            let stem = &text[..text.len() - suffix.len()];
            // "D" alone must not eat the last digit of a plain number.
            let boundary_ok = stem
                .trim_end()
                .chars()
                .last()
                .map(|c| c.is_ascii_digit() || c == '.')
                .unwrap_or(false);
            if boundary_ok {
                force_negative = true;
                text = stem.trim_end().to_string();
                break;
            }
        }
    }

    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
        .collect();

    if cleaned.is_empty() {
        return Err(ProfileError::AmountError(format!(
            "No numeric content in '{}'",
            raw
        )));
    }

    let value: f64 = cleaned
        .parse()
        .map_err(|_| ProfileError::AmountError(format!("Unparsable amount '{}'", raw)))?;

    if force_negative {
        Ok(-value.abs())
    } else {
        Ok(value)
    }
}
