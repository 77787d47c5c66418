//! Keyword-based entity detection over transaction descriptions. One
//! canonical implementation serves every ingestion path; the upload-analysis
//! and open-banking flows must not grow their own keyword lists.

use crate::catalog::{CardProcessorCatalog, LenderCatalog};
use crate::schema::{DetectedRepayments, Transaction};

/// How a description relates to the lender catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LenderMatch<'a> {
    /// No repayment vocabulary present.
    None,
    /// A generic term ("loan", "instalment", ...) matched but no brand did.
    /// Counts toward repayment totals, surfaces no lender name.
    Generic,
    /// A specific lender brand matched; carries the canonical name.
    Specific(&'a str),
}

/// Classifies one description against the lender catalog. Brand matches win
/// over generic terms.
pub fn match_lender<'a>(description: &str, catalog: &'a LenderCatalog) -> LenderMatch<'a> {
    let normalized = description.trim().to_lowercase();

    for lender in &catalog.lenders {
        if lender
            .aliases
            .iter()
            .any(|alias| !alias.is_empty() && normalized.contains(alias))
        {
            return LenderMatch::Specific(&lender.canonical);
        }
    }

    if catalog
        .generic_terms
        .iter()
        .any(|term| !term.is_empty() && normalized.contains(term))
    {
        return LenderMatch::Generic;
    }

    LenderMatch::None
}

/// Resolves a description against the card-processor catalog.
pub fn match_card_processor<'a>(
    description: &str,
    catalog: &'a CardProcessorCatalog,
) -> Option<&'a str> {
    let normalized = description.trim().to_lowercase();

    catalog
        .processors
        .iter()
        .find(|processor| {
            processor
                .aliases
                .iter()
                .any(|alias| !alias.is_empty() && normalized.contains(alias))
        })
        .map(|processor| processor.canonical.as_str())
}

/// Appends a canonical name unless a case-insensitive equal is already
/// present. First-seen casing is kept.
pub fn push_canonical(names: &mut Vec<String>, candidate: &str) {
    if !names
        .iter()
        .any(|existing| existing.eq_ignore_ascii_case(candidate))
    {
        names.push(candidate.to_string());
    }
}

/// Scans outflow transactions for repayment obligations. Both brand and
/// generic matches count toward `count` and `total_amount`; only brand
/// matches contribute canonical names to `lenders`.
pub fn detect_repayments(
    transactions: &[Transaction],
    catalog: &LenderCatalog,
) -> DetectedRepayments {
    let mut detected = DetectedRepayments::default();

    for txn in transactions.iter().filter(|t| t.amount < 0.0) {
        match match_lender(&txn.description, catalog) {
            LenderMatch::Specific(canonical) => {
                detected.count += 1;
                detected.total_amount += txn.amount.abs();
                push_canonical(&mut detected.lenders, canonical);
            }
            LenderMatch::Generic => {
                detected.count += 1;
                detected.total_amount += txn.amount.abs();
            }
            LenderMatch::None => {}
        }
    }

    detected
}

/// Summed settlement inflows and canonical provider names from card
/// acquirers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardSettlementScan {
    pub total_inflow: f64,
    pub providers: Vec<String>,
}

/// Scans inflow transactions for card-acquirer settlement credits.
pub fn detect_card_settlements(
    transactions: &[Transaction],
    catalog: &CardProcessorCatalog,
) -> CardSettlementScan {
    let mut scan = CardSettlementScan::default();

    for txn in transactions.iter().filter(|t| t.amount > 0.0) {
        if let Some(canonical) = match_card_processor(&txn.description, catalog) {
            scan.total_inflow += txn.amount;
            push_canonical(&mut scan.providers, canonical);
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(description: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            description: description.to_string(),
            amount,
            running_balance: None,
        }
    }

    #[test]
    fn test_specific_match_beats_generic() {
        let catalog = LenderCatalog::default();
        // "IWOCA LOAN REPAYMENT" contains both a brand and generic terms.
        assert_eq!(
            match_lender("IWOCA LOAN REPAYMENT", &catalog),
            LenderMatch::Specific("Iwoca")
        );
        assert_eq!(
            match_lender("  DD LOAN INSTALMENT ", &catalog),
            LenderMatch::Generic
        );
        assert_eq!(match_lender("TESCO GROCERIES", &catalog), LenderMatch::None);
    }

    #[test]
    fn test_generic_match_surfaces_no_lender_name() {
        let catalog = LenderCatalog::default();
        let txns = vec![
            txn("IWOCA REPAYMENT", -500.0),
            txn("MONTHLY LOAN PAYMENT", -120.0),
            txn("GROCERIES", -40.0),
        ];

        let detected = detect_repayments(&txns, &catalog);
        assert_eq!(detected.count, 2);
        assert_eq!(detected.total_amount, 620.0);
        assert_eq!(detected.lenders, vec!["Iwoca".to_string()]);
    }

    #[test]
    fn test_inflows_never_count_as_repayments() {
        let catalog = LenderCatalog::default();
        let txns = vec![txn("IWOCA DRAWDOWN", 5000.0)];
        let detected = detect_repayments(&txns, &catalog);
        assert_eq!(detected.count, 0);
    }

    #[test]
    fn test_detection_is_idempotent_and_dedups_casing() {
        let catalog = LenderCatalog::default();
        let txns = vec![
            txn("Iwoca Repayment", -100.0),
            txn("IWOCA REPAYMENT", -100.0),
            txn("iwoca repayment 3", -100.0),
        ];

        let first = detect_repayments(&txns, &catalog);
        let second = detect_repayments(&txns, &catalog);
        assert_eq!(first, second);
        assert_eq!(first.count, 3);
        assert_eq!(first.lenders, vec!["Iwoca".to_string()]);
    }

    #[test]
    fn test_card_alias_groups_resolve_to_canonical() {
        let catalog = CardProcessorCatalog::default();
        let txns = vec![
            txn("WPY SETTLEMENT 00231", 900.0),
            txn("WORLDPAY STLMNT", 450.0),
            txn("IZETTLE PAYOUT", 300.0),
            txn("CARD REFUND SQUARE", -50.0),
        ];

        let scan = detect_card_settlements(&txns, &catalog);
        assert_eq!(scan.total_inflow, 1650.0);
        assert_eq!(
            scan.providers,
            vec!["Worldpay".to_string(), "Zettle".to_string()]
        );
    }

    #[test]
    fn test_push_canonical_keeps_first_seen_casing() {
        let mut names = Vec::new();
        push_canonical(&mut names, "Worldpay");
        push_canonical(&mut names, "WORLDPAY");
        push_canonical(&mut names, "worldpay");
        push_canonical(&mut names, "Stripe");
        assert_eq!(names, vec!["Worldpay".to_string(), "Stripe".to_string()]);
    }
}
