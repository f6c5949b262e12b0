use thiserror::Error;

/// Error type that captures common ledger-engine failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("no actor identity available")]
    MissingIdentity,
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),
}
