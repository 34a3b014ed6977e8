use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("amount must be between {min} and {max}")]
    InvalidAmount { min: i64, max: i64 },

    #[error("{0}")]
    Validation(String),

    #[error("insufficient balance: {available} available, {requested} requested")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{entity} {id} is already {status}")]
    InvalidState {
        entity: &'static str,
        id: String,
        status: String,
    },

    #[error("{0}")]
    Duplicate(String),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Stored state disagrees with itself; never expected outside corruption.
    #[error("ledger invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
