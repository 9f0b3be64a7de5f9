use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, DuelpotError>;

#[derive(Error, Debug)]
pub enum DuelpotError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Insufficient funds: need {need} units, have {available} units")]
    InsufficientFunds { need: u64, available: u64 },

    #[error("Account not found: {name}")]
    AccountNotFound { name: String },

    #[error("Unknown account: {0}")]
    UnknownAccount(Uuid),

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DuelpotError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
