pub mod account_store;
pub mod entry_store;

pub use account_store::AccountStore;
pub use entry_store::EntryStore;

use crate::error::{DuelpotError, Result};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

/// SQLite-backed storage. All access goes through a single connection
/// behind a mutex, so mutating operations are serialized.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DuelpotError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // Accounts table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                balance INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Journal table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                txid TEXT NOT NULL,
                account_id TEXT NOT NULL,
                amount INTEGER NOT NULL,
                counterparty TEXT,
                timestamp INTEGER NOT NULL,
                kind TEXT NOT NULL,
                FOREIGN KEY (account_id) REFERENCES accounts(id),
                PRIMARY KEY (txid, account_id)
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
