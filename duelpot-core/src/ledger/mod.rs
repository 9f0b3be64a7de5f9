pub mod memory;
pub mod sqlite;

pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;

use crate::error::Result;
use crate::types::{Amount, LedgerEntry};
use async_trait::async_trait;
use uuid::Uuid;

/// Balance-transfer service the lottery engine runs against.
///
/// Implementations must execute mutating calls one at a time and
/// all-or-nothing: a failed `transfer` leaves both balances untouched.
/// Only `issue` creates units; `transfer` conserves total supply.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Open a new account with a unique name and zero balance.
    async fn open_account(&self, name: &str) -> Result<Uuid>;

    /// Current balance of an account.
    async fn balance(&self, account: Uuid) -> Result<Amount>;

    /// Credit freshly created units to an account (faucet-style).
    /// Returns the journal txid.
    async fn issue(&self, account: Uuid, amount: Amount) -> Result<String>;

    /// Move `amount` from one account to another atomically.
    /// Returns the journal txid.
    async fn transfer(&self, from: Uuid, to: Uuid, amount: Amount) -> Result<String>;

    /// Journal entries for an account, oldest first.
    async fn history(&self, account: Uuid) -> Result<Vec<LedgerEntry>>;
}
