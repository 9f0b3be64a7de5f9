use crate::error::Result;
use crate::storage::Storage;
use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountData {
    pub id: String,
    pub name: String,
    pub balance: u64,
    pub created_at: chrono::DateTime<Utc>,
}

pub struct AccountStore<'a> {
    storage: &'a Storage,
}

impl<'a> AccountStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save_account(&self, account: &AccountData) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO accounts (id, name, balance, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                account.id,
                account.name,
                account.balance,
                account.created_at.timestamp(),
            ],
        )?;

        Ok(())
    }

    pub async fn load_account(&self, account_id: &str) -> Result<AccountData> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, name, balance, created_at
             FROM accounts WHERE id = ?1",
        )?;

        let account = stmt.query_row(params![account_id], |row| {
            Ok(AccountData {
                id: row.get(0)?,
                name: row.get(1)?,
                balance: row.get(2)?,
                created_at: chrono::DateTime::from_timestamp(row.get(3)?, 0)
                    .unwrap_or_else(Utc::now),
            })
        })?;

        Ok(account)
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountData>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, name, balance, created_at
             FROM accounts ORDER BY created_at ASC",
        )?;

        let account_iter = stmt.query_map([], |row| {
            Ok(AccountData {
                id: row.get(0)?,
                name: row.get(1)?,
                balance: row.get(2)?,
                created_at: chrono::DateTime::from_timestamp(row.get(3)?, 0)
                    .unwrap_or_else(Utc::now),
            })
        })?;

        let mut accounts = Vec::new();
        for account in account_iter {
            accounts.push(account?);
        }

        Ok(accounts)
    }

    pub async fn delete_account(&self, account_id: &str) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "DELETE FROM entries WHERE account_id = ?1",
            params![account_id],
        )?;
        conn.execute("DELETE FROM accounts WHERE id = ?1", params![account_id])?;

        Ok(())
    }

    pub async fn account_exists(&self, name: &str) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}
