use duelpot_core::{Amount, DuelpotError};
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, LotteryError>;

#[derive(Error, Debug)]
pub enum LotteryError {
    #[error("Ledger error: {0}")]
    Core(#[from] DuelpotError),

    #[error("Invalid stake amount: stake is {expected}, got {deposited}")]
    InvalidStakeAmount { expected: Amount, deposited: Amount },

    #[error("Player is already entered: {0}")]
    DuplicateEntrant(Uuid),

    #[error("Game is full")]
    GameFull,

    #[error("Game not ready")]
    GameNotReady,

    #[error("Must be operator")]
    Unauthorized,

    #[error("Payout failed: {0}")]
    PayoutFailed(String),

    #[error("Invalid game config: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
