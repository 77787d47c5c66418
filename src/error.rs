use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Malformed record at index {index}: {details}")]
    MalformedRecord { index: usize, details: String },

    #[error("No usable balance source: a current or ledger balance is required for reconstruction")]
    InsufficientBalanceData,

    #[error("Transaction set is empty")]
    EmptyTransactionSet,

    #[error("Invalid entity catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid lender panel: {0}")]
    InvalidPanel(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Date parse error: {0}")]
    DateError(String),

    #[error("Amount parse error: {0}")]
    AmountError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
