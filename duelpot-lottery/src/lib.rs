//! Two-party escrow lottery engine.
//!
//! Exactly two players each deposit a fixed stake with an escrow
//! account; the operator triggers a draw, the winner takes the whole
//! pot, and the game resets for the next round. Fund custody goes
//! through the [`duelpot_core::Ledger`] seam.

pub mod config;
pub mod draw;
pub mod error;
pub mod game;

pub use config::GameConfig;
pub use error::{LotteryError, Result};
pub use game::{DrawOutcome, GameInfo, GameSnapshot, GameState, LotteryGame, MAX_PLAYERS};

use duelpot_core::Ledger;
use std::sync::Arc;

/// Create a new game for `config` with custody on `ledger`.
pub async fn create_game(config: GameConfig, ledger: Arc<dyn Ledger>) -> Result<LotteryGame> {
    LotteryGame::new(config, ledger).await
}
