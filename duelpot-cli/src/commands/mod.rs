mod account;
mod game;

pub use account::{handle_account_command, AccountCommands};
pub use game::{handle_game_command, GameCommands};

use anyhow::Result;
use duelpot_core::{AccountManager, Ledger, SqliteLedger, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Shared command context: account manager and ledger over one storage,
/// plus the location of the game snapshot store.
pub struct Context {
    pub manager: AccountManager,
    ledger: Arc<SqliteLedger>,
    pub games_path: PathBuf,
}

impl Context {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        let storage = Arc::new(Storage::new(&data_dir.join("duelpot.db")).await?);

        Ok(Self {
            manager: AccountManager::new(storage.clone()),
            ledger: Arc::new(SqliteLedger::new(storage)),
            games_path: data_dir.join("games.json"),
        })
    }

    pub fn ledger(&self) -> Arc<dyn Ledger> {
        self.ledger.clone()
    }

    /// Display name for an account id, falling back to the id itself
    /// for accounts without a managed name (e.g. escrows).
    pub async fn account_label(&self, id: Uuid) -> String {
        match self.manager.list_accounts().await {
            Ok(accounts) => accounts
                .into_iter()
                .find(|a| a.id == id)
                .map(|a| a.name)
                .unwrap_or_else(|| id.to_string()),
            Err(_) => id.to_string(),
        }
    }
}
