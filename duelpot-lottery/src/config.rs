use crate::{LotteryError, Result};
use duelpot_core::Amount;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Construction-time game parameters. Both fields are fixed for the
/// lifetime of the game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameConfig {
    /// Deposit required from each entrant.
    pub stake: Amount,
    /// The only identity allowed to trigger a draw.
    pub operator: Uuid,
}

impl GameConfig {
    pub fn new(stake: Amount, operator: Uuid) -> Self {
        Self { stake, operator }
    }

    pub fn validate(&self) -> Result<()> {
        // Amount is unsigned, so a negative stake is unrepresentable;
        // zero is the remaining invalid configuration.
        if self.stake.is_zero() {
            return Err(LotteryError::Config(
                "Stake must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stake_is_invalid() {
        let config = GameConfig::new(Amount::ZERO, Uuid::new_v4());
        assert!(matches!(
            config.validate().unwrap_err(),
            LotteryError::Config(_)
        ));
    }

    #[test]
    fn positive_stake_is_valid() {
        let config = GameConfig::new(Amount::from_units(1), Uuid::new_v4());
        assert!(config.validate().is_ok());
    }
}
