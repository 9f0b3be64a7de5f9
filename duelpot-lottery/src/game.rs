use crate::config::GameConfig;
use crate::draw;
use crate::{LotteryError, Result};
use chrono::{DateTime, Utc};
use duelpot_core::{Amount, DuelpotError, Ledger};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const MAX_PLAYERS: usize = 2;

/// Lifecycle state, derived from the roster. The machine is cyclic:
/// `Empty -> HalfFull -> Ready -> (draw) -> Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Empty,
    HalfFull,
    Ready,
}

/// A single two-player escrow lottery.
///
/// The engine owns all round state and the escrow account; the injected
/// [`Ledger`] is the only thing that moves funds, and only as the direct
/// consequence of a validated `join` or `draw`.
pub struct LotteryGame {
    id: Uuid,
    stake: Amount,
    operator: Uuid,
    escrow: Uuid,
    players: Vec<Uuid>,
    pot: Amount,
    rounds_completed: u64,
    created_at: DateTime<Utc>,
    ledger: Arc<dyn Ledger>,
}

/// Result of a successful draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawOutcome {
    pub winner: Uuid,
    pub payout: Amount,
    pub round: u64,
    pub txid: String,
    /// Hex of the seed the winner index was derived from. Public once
    /// the draw has committed.
    pub seed: String,
}

/// Game info for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: Uuid,
    pub stake: Amount,
    pub operator: Uuid,
    pub escrow: Uuid,
    pub state: GameState,
    pub players: Vec<Uuid>,
    pub pot: Amount,
    pub rounds_completed: u64,
    pub created_at: DateTime<Utc>,
}

/// Persistable view of a game, for hosts that keep games across
/// processes. Restored snapshots are re-validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: Uuid,
    pub stake: Amount,
    pub operator: Uuid,
    pub escrow: Uuid,
    pub players: Vec<Uuid>,
    pub pot: Amount,
    pub rounds_completed: u64,
    pub created_at: DateTime<Utc>,
}

impl LotteryGame {
    /// Create a new game. Opens a dedicated escrow account on the
    /// ledger; the game starts empty with a zero pot.
    pub async fn new(config: GameConfig, ledger: Arc<dyn Ledger>) -> Result<Self> {
        config.validate()?;

        let id = Uuid::new_v4();
        let escrow = ledger
            .open_account(&format!("game_escrow_{}", id))
            .await?;

        tracing::info!("Created game {} with stake {}", id, config.stake);

        Ok(Self {
            id,
            stake: config.stake,
            operator: config.operator,
            escrow,
            players: Vec::new(),
            pot: Amount::ZERO,
            rounds_completed: 0,
            created_at: Utc::now(),
            ledger,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stake(&self) -> Amount {
        self.stake
    }

    pub fn operator(&self) -> Uuid {
        self.operator
    }

    pub fn escrow(&self) -> Uuid {
        self.escrow
    }

    pub fn pot(&self) -> Amount {
        self.pot
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    /// Registered entrants for the current round, in join order.
    pub fn players(&self) -> &[Uuid] {
        &self.players
    }

    pub fn state(&self) -> GameState {
        match self.players.len() {
            0 => GameState::Empty,
            1 => GameState::HalfFull,
            _ => GameState::Ready,
        }
    }

    /// Register `caller` for the current round with their deposit.
    ///
    /// The deposit must equal the stake exactly. Checks run in the same
    /// order the contract surface applies them: amount, capacity, then
    /// duplicate entry. Custody moves before the roster mutates, so a
    /// failed transfer leaves the game untouched.
    pub async fn join(&mut self, caller: Uuid, deposit: Amount) -> Result<()> {
        if deposit != self.stake {
            return Err(LotteryError::InvalidStakeAmount {
                expected: self.stake,
                deposited: deposit,
            });
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(LotteryError::GameFull);
        }
        if self.players.contains(&caller) {
            return Err(LotteryError::DuplicateEntrant(caller));
        }

        let new_pot = self
            .pot
            .checked_add(deposit)
            .ok_or(LotteryError::Core(DuelpotError::AmountOverflow))?;

        self.ledger.transfer(caller, self.escrow, deposit).await?;

        self.players.push(caller);
        self.pot = new_pot;

        tracing::info!(
            "Player {} joined game {} ({}/{})",
            caller,
            self.id,
            self.players.len(),
            MAX_PLAYERS
        );

        if self.players.len() == MAX_PLAYERS {
            tracing::info!("Game {} ready for draw", self.id);
        }

        Ok(())
    }

    /// Select a winner, pay out the whole pot, and reset for the next
    /// round. Only the operator may call this, and only with both slots
    /// filled.
    pub async fn draw(&mut self, caller: Uuid) -> Result<DrawOutcome> {
        let seed = draw::draw_seed(self.id, self.rounds_completed);
        self.draw_with_seed(caller, &seed).await
    }

    /// Draw with a caller-supplied seed. The seed must not have been
    /// observable to any player before both joins committed.
    pub async fn draw_with_seed(&mut self, caller: Uuid, seed: &[u8]) -> Result<DrawOutcome> {
        if caller != self.operator {
            return Err(LotteryError::Unauthorized);
        }
        if self.players.len() != MAX_PLAYERS {
            return Err(LotteryError::GameNotReady);
        }

        let winner = self.players[draw::winning_index(seed)];
        let payout = self.pot;

        // Pay out first; the state reset commits only on a confirmed
        // transfer. A failed payout leaves the game Ready, as if the
        // draw never ran.
        let txid = self
            .ledger
            .transfer(self.escrow, winner, payout)
            .await
            .map_err(|e| LotteryError::PayoutFailed(e.to_string()))?;

        self.players.clear();
        self.pot = Amount::ZERO;
        self.rounds_completed += 1;

        tracing::info!(
            "Game {} round {} complete: {} takes {}",
            self.id,
            self.rounds_completed,
            winner,
            payout
        );

        Ok(DrawOutcome {
            winner,
            payout,
            round: self.rounds_completed,
            txid,
            seed: hex::encode(seed),
        })
    }

    pub fn info(&self) -> GameInfo {
        GameInfo {
            id: self.id,
            stake: self.stake,
            operator: self.operator,
            escrow: self.escrow,
            state: self.state(),
            players: self.players.clone(),
            pot: self.pot,
            rounds_completed: self.rounds_completed,
            created_at: self.created_at,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id,
            stake: self.stake,
            operator: self.operator,
            escrow: self.escrow,
            players: self.players.clone(),
            pot: self.pot,
            rounds_completed: self.rounds_completed,
            created_at: self.created_at,
        }
    }

    /// Rebuild a game from a snapshot, re-validating the config and the
    /// pot invariant so a corrupt snapshot cannot produce a game that
    /// pays out more or less than it holds.
    pub fn restore(snapshot: GameSnapshot, ledger: Arc<dyn Ledger>) -> Result<Self> {
        GameConfig::new(snapshot.stake, snapshot.operator).validate()?;

        if snapshot.players.len() > MAX_PLAYERS {
            return Err(LotteryError::Config(format!(
                "Snapshot has {} players, limit is {}",
                snapshot.players.len(),
                MAX_PLAYERS
            )));
        }
        for (i, player) in snapshot.players.iter().enumerate() {
            if snapshot.players[..i].contains(player) {
                return Err(LotteryError::Config(format!(
                    "Snapshot lists player {} twice",
                    player
                )));
            }
        }

        let expected_pot = snapshot
            .stake
            .checked_mul(snapshot.players.len() as u64)
            .ok_or(LotteryError::Core(DuelpotError::AmountOverflow))?;
        if snapshot.pot != expected_pot {
            return Err(LotteryError::Config(format!(
                "Snapshot pot {} does not match stake x players ({})",
                snapshot.pot, expected_pot
            )));
        }

        Ok(Self {
            id: snapshot.id,
            stake: snapshot.stake,
            operator: snapshot.operator,
            escrow: snapshot.escrow,
            players: snapshot.players,
            pot: snapshot.pot,
            rounds_completed: snapshot.rounds_completed,
            created_at: snapshot.created_at,
            ledger,
        })
    }
}

impl std::fmt::Debug for LotteryGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LotteryGame")
            .field("id", &self.id)
            .field("stake", &self.stake)
            .field("operator", &self.operator)
            .field("state", &self.state())
            .field("players", &self.players)
            .field("pot", &self.pot)
            .field("rounds_completed", &self.rounds_completed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use duelpot_core::{LedgerEntry, MemoryLedger};
    use std::sync::atomic::{AtomicBool, Ordering};

    const STAKE: Amount = Amount::from_units(10);
    const FUNDING: Amount = Amount::from_units(50);

    struct Fixture {
        ledger: Arc<MemoryLedger>,
        operator: Uuid,
        alice: Uuid,
        bob: Uuid,
        game: LotteryGame,
    }

    async fn fixture() -> Fixture {
        let ledger = Arc::new(MemoryLedger::new());
        let alice = ledger.open_account("alice").await.unwrap();
        let bob = ledger.open_account("bob").await.unwrap();
        ledger.issue(alice, FUNDING).await.unwrap();
        ledger.issue(bob, FUNDING).await.unwrap();

        let operator = Uuid::new_v4();
        let game = LotteryGame::new(
            GameConfig::new(STAKE, operator),
            ledger.clone(),
        )
        .await
        .unwrap();

        Fixture {
            ledger,
            operator,
            alice,
            bob,
            game,
        }
    }

    #[tokio::test]
    async fn new_game_starts_empty() {
        let f = fixture().await;

        assert_eq!(f.game.state(), GameState::Empty);
        assert!(f.game.players().is_empty());
        assert_eq!(f.game.pot(), Amount::ZERO);
        assert_eq!(
            f.ledger.balance(f.game.escrow()).await.unwrap(),
            Amount::ZERO
        );
    }

    #[tokio::test]
    async fn zero_stake_rejected_at_creation() {
        let ledger = Arc::new(MemoryLedger::new());
        let err = LotteryGame::new(
            GameConfig::new(Amount::ZERO, Uuid::new_v4()),
            ledger,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LotteryError::Config(_)));
    }

    #[tokio::test]
    async fn join_moves_stake_into_escrow() {
        let mut f = fixture().await;

        f.game.join(f.alice, STAKE).await.unwrap();

        assert_eq!(f.game.players(), &[f.alice]);
        assert_eq!(f.game.state(), GameState::HalfFull);
        assert_eq!(f.game.pot(), STAKE);
        assert_eq!(f.ledger.balance(f.game.escrow()).await.unwrap(), STAKE);
        assert_eq!(
            f.ledger.balance(f.alice).await.unwrap(),
            FUNDING.checked_sub(STAKE).unwrap()
        );
    }

    #[tokio::test]
    async fn wrong_deposit_rejected_without_mutation() {
        let mut f = fixture().await;

        for deposit in [Amount::ZERO, Amount::from_units(9), Amount::from_units(11)] {
            let err = f.game.join(f.alice, deposit).await.unwrap_err();
            assert!(matches!(err, LotteryError::InvalidStakeAmount { .. }));
        }

        assert!(f.game.players().is_empty());
        assert_eq!(f.game.pot(), Amount::ZERO);
        assert_eq!(f.ledger.balance(f.alice).await.unwrap(), FUNDING);
    }

    #[tokio::test]
    async fn duplicate_entrant_rejected() {
        let mut f = fixture().await;

        f.game.join(f.alice, STAKE).await.unwrap();
        let err = f.game.join(f.alice, STAKE).await.unwrap_err();

        assert!(matches!(err, LotteryError::DuplicateEntrant(id) if id == f.alice));
        assert_eq!(f.game.players(), &[f.alice]);
        assert_eq!(f.game.pot(), STAKE);
    }

    #[tokio::test]
    async fn third_entrant_rejected() {
        let mut f = fixture().await;
        let carol = f.ledger.open_account("carol").await.unwrap();
        f.ledger.issue(carol, FUNDING).await.unwrap();

        f.game.join(f.alice, STAKE).await.unwrap();
        f.game.join(f.bob, STAKE).await.unwrap();

        let err = f.game.join(carol, STAKE).await.unwrap_err();
        assert!(matches!(err, LotteryError::GameFull));
        assert_eq!(f.game.players(), &[f.alice, f.bob]);
    }

    #[tokio::test]
    async fn repeat_join_on_full_game_reports_full() {
        // Capacity is checked before duplicate entry, so a player
        // re-joining a full game sees GameFull.
        let mut f = fixture().await;

        f.game.join(f.alice, STAKE).await.unwrap();
        f.game.join(f.bob, STAKE).await.unwrap();

        let err = f.game.join(f.bob, STAKE).await.unwrap_err();
        assert!(matches!(err, LotteryError::GameFull));
    }

    #[tokio::test]
    async fn underfunded_join_leaves_game_untouched() {
        let mut f = fixture().await;
        let pauper = f.ledger.open_account("pauper").await.unwrap();

        let err = f.game.join(pauper, STAKE).await.unwrap_err();
        assert!(matches!(
            err,
            LotteryError::Core(DuelpotError::InsufficientFunds { .. })
        ));
        assert!(f.game.players().is_empty());
        assert_eq!(f.game.pot(), Amount::ZERO);
    }

    #[tokio::test]
    async fn non_operator_cannot_draw() {
        let mut f = fixture().await;

        f.game.join(f.alice, STAKE).await.unwrap();
        f.game.join(f.bob, STAKE).await.unwrap();

        for caller in [f.alice, f.bob, Uuid::new_v4()] {
            let err = f.game.draw(caller).await.unwrap_err();
            assert!(matches!(err, LotteryError::Unauthorized));
        }

        assert_eq!(f.game.state(), GameState::Ready);
        assert_eq!(f.game.pot(), STAKE.checked_mul(2).unwrap());
    }

    #[tokio::test]
    async fn draw_requires_two_players() {
        let mut f = fixture().await;

        let err = f.game.draw(f.operator).await.unwrap_err();
        assert!(matches!(err, LotteryError::GameNotReady));

        f.game.join(f.alice, STAKE).await.unwrap();
        let err = f.game.draw(f.operator).await.unwrap_err();
        assert!(matches!(err, LotteryError::GameNotReady));
        assert_eq!(f.game.players(), &[f.alice]);
    }

    #[tokio::test]
    async fn draw_pays_winner_and_resets() {
        let mut f = fixture().await;

        f.game.join(f.alice, STAKE).await.unwrap();
        f.game.join(f.bob, STAKE).await.unwrap();
        let pot = f.game.pot();

        let outcome = f.game.draw(f.operator).await.unwrap();

        assert!(outcome.winner == f.alice || outcome.winner == f.bob);
        assert_eq!(outcome.payout, pot);
        assert_eq!(outcome.round, 1);

        // Winner holds funding - stake + pot; loser is down one stake.
        let winner_balance = f.ledger.balance(outcome.winner).await.unwrap();
        assert_eq!(
            winner_balance,
            FUNDING.checked_sub(STAKE).unwrap().checked_add(pot).unwrap()
        );

        assert!(f.game.players().is_empty());
        assert_eq!(f.game.pot(), Amount::ZERO);
        assert_eq!(f.game.state(), GameState::Empty);
        assert_eq!(
            f.ledger.balance(f.game.escrow()).await.unwrap(),
            Amount::ZERO
        );

        // Next round accepts a previous entrant again.
        f.game.join(f.alice, STAKE).await.unwrap();
        assert_eq!(f.game.players(), &[f.alice]);
    }

    #[tokio::test]
    async fn seeded_draw_is_deterministic() {
        let mut f = fixture().await;
        f.game.join(f.alice, STAKE).await.unwrap();
        f.game.join(f.bob, STAKE).await.unwrap();

        // Even parity selects slot 0.
        let outcome = f.game.draw_with_seed(f.operator, &[0u8; 32]).await.unwrap();
        assert_eq!(outcome.winner, f.alice);

        f.game.join(f.alice, STAKE).await.unwrap();
        f.game.join(f.bob, STAKE).await.unwrap();

        // Odd parity selects slot 1.
        let mut seed = [0u8; 32];
        seed[31] = 1;
        let outcome = f.game.draw_with_seed(f.operator, &seed).await.unwrap();
        assert_eq!(outcome.winner, f.bob);
    }

    /// Ledger wrapper whose transfers can be switched off, to exercise
    /// the payout-failure path.
    struct FlakyLedger {
        inner: MemoryLedger,
        refuse_transfers: AtomicBool,
    }

    #[async_trait]
    impl Ledger for FlakyLedger {
        async fn open_account(&self, name: &str) -> duelpot_core::Result<Uuid> {
            self.inner.open_account(name).await
        }

        async fn balance(&self, account: Uuid) -> duelpot_core::Result<Amount> {
            self.inner.balance(account).await
        }

        async fn issue(&self, account: Uuid, amount: Amount) -> duelpot_core::Result<String> {
            self.inner.issue(account, amount).await
        }

        async fn transfer(
            &self,
            from: Uuid,
            to: Uuid,
            amount: Amount,
        ) -> duelpot_core::Result<String> {
            if self.refuse_transfers.load(Ordering::SeqCst) {
                return Err(DuelpotError::internal("ledger offline"));
            }
            self.inner.transfer(from, to, amount).await
        }

        async fn history(&self, account: Uuid) -> duelpot_core::Result<Vec<LedgerEntry>> {
            self.inner.history(account).await
        }
    }

    #[tokio::test]
    async fn failed_payout_rolls_back_the_draw() {
        let ledger = Arc::new(FlakyLedger {
            inner: MemoryLedger::new(),
            refuse_transfers: AtomicBool::new(false),
        });
        let alice = ledger.open_account("alice").await.unwrap();
        let bob = ledger.open_account("bob").await.unwrap();
        ledger.issue(alice, FUNDING).await.unwrap();
        ledger.issue(bob, FUNDING).await.unwrap();

        let operator = Uuid::new_v4();
        let mut game = LotteryGame::new(
            GameConfig::new(STAKE, operator),
            ledger.clone(),
        )
        .await
        .unwrap();

        game.join(alice, STAKE).await.unwrap();
        game.join(bob, STAKE).await.unwrap();

        ledger.refuse_transfers.store(true, Ordering::SeqCst);
        let err = game.draw(operator).await.unwrap_err();
        assert!(matches!(err, LotteryError::PayoutFailed(_)));

        // The draw is treated as not having happened.
        assert_eq!(game.state(), GameState::Ready);
        assert_eq!(game.players().len(), 2);
        assert_eq!(game.pot(), STAKE.checked_mul(2).unwrap());
        assert_eq!(
            ledger.balance(game.escrow()).await.unwrap(),
            STAKE.checked_mul(2).unwrap()
        );
        assert_eq!(game.rounds_completed(), 0);

        // Once the ledger recovers, the same draw succeeds.
        ledger.refuse_transfers.store(false, Ordering::SeqCst);
        let outcome = game.draw(operator).await.unwrap();
        assert_eq!(outcome.round, 1);
        assert_eq!(game.state(), GameState::Empty);
    }

    #[tokio::test]
    async fn snapshot_round_trips() {
        let mut f = fixture().await;
        f.game.join(f.alice, STAKE).await.unwrap();

        let snapshot = f.game.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: GameSnapshot = serde_json::from_str(&json).unwrap();

        let game = LotteryGame::restore(restored, f.ledger.clone()).unwrap();
        assert_eq!(game.id(), f.game.id());
        assert_eq!(game.players(), f.game.players());
        assert_eq!(game.pot(), f.game.pot());
        assert_eq!(game.state(), GameState::HalfFull);
    }

    #[tokio::test]
    async fn tampered_snapshot_rejected() {
        let mut f = fixture().await;
        f.game.join(f.alice, STAKE).await.unwrap();

        let mut snapshot = f.game.snapshot();
        snapshot.pot = Amount::from_units(999);

        let err =
            LotteryGame::restore(snapshot, f.ledger.clone()).unwrap_err();
        assert!(matches!(err, LotteryError::Config(_)));

        let mut snapshot = f.game.snapshot();
        snapshot.players = vec![f.alice, f.alice];
        snapshot.pot = STAKE.checked_mul(2).unwrap();
        assert!(LotteryGame::restore(snapshot, f.ledger.clone()).is_err());
    }
}
