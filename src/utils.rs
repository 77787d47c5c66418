use crate::schema::Transaction;
use chrono::NaiveDate;

/// Average Gregorian month length, used to turn day spans into fractional months.
pub const AVERAGE_DAYS_PER_MONTH: f64 = 30.44;

/// Spans at or below this many days are treated as a single statement month.
pub const SINGLE_MONTH_SPAN_DAYS: i64 = 45;

/// Converts a date span into the divisor used for every "average monthly"
/// metric computed from the same transaction set.
///
/// The span is inclusive of both endpoints: `total_days = (last - first) + 1`.
/// Spans of up to 45 days count as one month; longer spans divide by the
/// average month length (30.44 days). Never returns less than 1.0, so it is
/// always safe to divide by.
pub fn month_divisor(first: NaiveDate, last: NaiveDate) -> f64 {
    let (first, last) = if last < first {
        (last, first)
    } else {
        (first, last)
    };

    let total_days = (last - first).num_days() + 1;
    if total_days <= SINGLE_MONTH_SPAN_DAYS {
        1.0
    } else {
        total_days as f64 / AVERAGE_DAYS_PER_MONTH
    }
}

/// Month divisor for a transaction set. Dates are not assumed to be sorted;
/// zero or one transaction yields 1.0.
pub fn transaction_span_divisor(transactions: &[Transaction]) -> f64 {
    let first = transactions.iter().map(|t| t.date).min();
    let last = transactions.iter().map(|t| t.date).max();

    match (first, last) {
        (Some(first), Some(last)) => month_divisor(first, last),
        _ => 1.0,
    }
}

/// Inclusive day count of a transaction set's date span. Zero transactions
/// yield 0; a single transaction yields 1.
pub fn transaction_span_days(transactions: &[Transaction]) -> usize {
    let first = transactions.iter().map(|t| t.date).min();
    let last = transactions.iter().map(|t| t.date).max();

    match (first, last) {
        (Some(first), Some(last)) => ((last - first).num_days() + 1) as usize,
        _ => 0,
    }
}
