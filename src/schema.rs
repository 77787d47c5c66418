use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sign convention declared by the source supplying the raw records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum SignConvention {
    #[schemars(
        description = "Positive amounts are money coming into the account (typical statement convention)"
    )]
    InflowPositive,

    #[schemars(
        description = "Positive amounts are money leaving the account (open-banking feeds such as Plaid use this)"
    )]
    OutflowPositive,
}

/// One ledger entry as supplied by a source, before normalization.
///
/// Fields are string-typed on purpose: extraction collaborators emit values
/// like "£1,234.56", "(500.00)" or "4,500 D", and the normalizer owns the
/// coercion rules.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawTransactionRecord {
    #[schemars(description = "Transaction date. Accepted formats: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, DD Mon YYYY")]
    pub date: String,

    #[schemars(description = "Free-text description exactly as it appears on the statement")]
    pub description: String,

    #[schemars(
        description = "Signed monetary amount. May contain a currency symbol, thousands separators, parentheses for negatives, or a trailing debit marker (D/DR/DEBIT/OD)"
    )]
    pub amount: String,

    #[serde(default)]
    #[schemars(
        description = "Ledger balance after this entry, if the source provides a balance column. Same formatting rules as amount"
    )]
    pub running_balance: Option<String>,
}

/// Everything the pipeline needs about one account from one source.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AccountData {
    #[schemars(description = "Raw transaction records for this account")]
    pub transactions: Vec<RawTransactionRecord>,

    #[schemars(description = "Which direction positive amounts point in the raw records")]
    pub sign_convention: SignConvention,

    #[serde(default)]
    #[schemars(
        description = "Current/closing balance, used to reconstruct daily balances when no ledger column exists"
    )]
    pub current_balance: Option<f64>,

    #[serde(default)]
    #[schemars(description = "ISO currency code (e.g. GBP). Defaults to GBP when absent")]
    pub currency_code: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "Account holder or account name, used to spot internal transfers between the applicant's own accounts"
    )]
    pub account_name: Option<String>,
}

impl AccountData {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AccountData)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// One normalized ledger entry. Positive amount always means money in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub running_balance: Option<f64>,
}

/// One end-of-day balance. Negative means overdrawn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DailyBalancePoint {
    pub date: NaiveDate,
    pub balance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectedRepayments {
    pub count: usize,
    pub total_amount: f64,
    /// Canonical lender names, case-insensitively deduplicated.
    pub lenders: Vec<String>,
}

/// Normalized financial summary for one account or one source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialProfile {
    pub average_monthly_income: f64,
    pub average_eod_balance: f64,
    /// Days with an end-of-day balance below 300 (local currency units).
    pub low_balance_day_count: usize,
    /// Days with an end-of-day balance below zero.
    pub negative_balance_day_count: usize,
    pub average_monthly_card_turnover: f64,
    pub detected_card_providers: Vec<String>,
    pub detected_repayments: DetectedRepayments,
    pub currency_code: String,
}

impl Default for FinancialProfile {
    fn default() -> Self {
        Self {
            average_monthly_income: 0.0,
            average_eod_balance: 0.0,
            low_balance_day_count: 0,
            negative_balance_day_count: 0,
            average_monthly_card_turnover: 0.0,
            detected_card_providers: Vec::new(),
            detected_repayments: DetectedRepayments::default(),
            currency_code: "GBP".to_string(),
        }
    }
}

/// The aggregate of one or more per-account profiles for a single applicant.
///
/// Same shape as [`FinancialProfile`]; the currency of the first contributing
/// profile is taken as the application currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationFinancialProfile {
    pub average_monthly_income: f64,
    pub average_eod_balance: f64,
    pub low_balance_day_count: usize,
    pub negative_balance_day_count: usize,
    pub average_monthly_card_turnover: f64,
    pub detected_card_providers: Vec<String>,
    pub detected_repayments: DetectedRepayments,
    pub currency_code: String,
}

impl Default for ApplicationFinancialProfile {
    fn default() -> Self {
        Self {
            average_monthly_income: 0.0,
            average_eod_balance: 0.0,
            low_balance_day_count: 0,
            negative_balance_day_count: 0,
            average_monthly_card_turnover: 0.0,
            detected_card_providers: Vec::new(),
            detected_repayments: DetectedRepayments::default(),
            currency_code: "GBP".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    LimitedCompany,
    SoleTrader,
    Partnership,
    Llp,
    Other,
}

/// Company attributes sourced from the registry and self-declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub entity_type: EntityType,
    pub time_trading_months: u32,
    pub has_filed_accounts: bool,
    pub insolvency_events: bool,
    pub iva: bool,
}

/// Commercial risk band as reported by the credit bureau. Some products
/// return a numeric index, others a label like "Minimal Risk".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CommercialBand {
    Index(u32),
    Label(String),
}

/// Credit attributes. Personal score is on the 0-999 consumer scale,
/// commercial score on the 0-100 Delphi scale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreditInfo {
    pub personal_score: Option<u32>,
    pub commercial_score: Option<u32>,
    pub commercial_band: Option<CommercialBand>,
}

/// Outcome of evaluating one lender rule against one application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderDecision {
    pub lender_id: String,
    pub lender_name: String,
    #[serde(rename = "match")]
    pub matched: bool,
    pub reasons: Vec<String>,
    pub refusal_reasons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = AccountData::schema_as_json().unwrap();
        assert!(schema_json.contains("transactions"));
        assert!(schema_json.contains("sign_convention"));
        assert!(schema_json.contains("running_balance"));
    }

    #[test]
    fn test_decision_serializes_match_field() {
        let decision = LenderDecision {
            lender_id: "swiftfund".to_string(),
            lender_name: "Swiftfund".to_string(),
            matched: true,
            reasons: vec!["Trading for 24m (min 6m)".to_string()],
            refusal_reasons: vec![],
        };

        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains("\"match\":true"));
    }

    #[test]
    fn test_commercial_band_deserializes_both_forms() {
        let index: CommercialBand = serde_json::from_str("4").unwrap();
        assert_eq!(index, CommercialBand::Index(4));

        let label: CommercialBand = serde_json::from_str("\"Minimal Risk\"").unwrap();
        assert_eq!(label, CommercialBand::Label("Minimal Risk".to_string()));
    }

    #[test]
    fn test_account_data_roundtrip() {
        let account = AccountData {
            transactions: vec![RawTransactionRecord {
                date: "2024-03-01".to_string(),
                description: "CARD SETTLEMENT WORLDPAY".to_string(),
                amount: "£1,250.00".to_string(),
                running_balance: Some("4,500 D".to_string()),
            }],
            sign_convention: SignConvention::InflowPositive,
            current_balance: Some(1000.0),
            currency_code: Some("GBP".to_string()),
            account_name: None,
        };

        let json = serde_json::to_string(&account).unwrap();
        let back: AccountData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transactions.len(), 1);
        assert_eq!(back.sign_convention, SignConvention::InflowPositive);
    }
}
