//! duelpot ledger service - accounts, balances and atomic transfers
//!
//! This library provides the custody layer the lottery engine runs
//! against: named accounts, a journaled balance ledger, and serialized
//! all-or-nothing transfers.

pub mod account;
pub mod error;
pub mod ledger;
pub mod storage;
pub mod types;

pub use account::{Account, AccountManager};
pub use error::{DuelpotError, Result};
pub use ledger::{Ledger, MemoryLedger, SqliteLedger};
pub use storage::Storage;
pub use types::{Amount, EntryKind, LedgerEntry};
