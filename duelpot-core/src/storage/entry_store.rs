use crate::error::Result;
use crate::storage::Storage;
use crate::types::{EntryKind, LedgerEntry};
use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

pub struct EntryStore<'a> {
    storage: &'a Storage,
}

impl<'a> EntryStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save_entry(&self, entry: &LedgerEntry) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT INTO entries (txid, account_id, amount, counterparty, timestamp, kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.txid,
                entry.account.to_string(),
                entry.amount,
                entry.counterparty.map(|c| c.to_string()),
                entry.timestamp.timestamp(),
                entry.kind.as_str(),
            ],
        )?;

        Ok(())
    }

    pub async fn account_history(&self, account: Uuid) -> Result<Vec<LedgerEntry>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT txid, account_id, amount, counterparty, timestamp, kind
             FROM entries WHERE account_id = ?1 ORDER BY timestamp ASC",
        )?;

        let entry_iter = stmt.query_map(params![account.to_string()], |row| {
            let account_str: String = row.get(1)?;
            let counterparty_str: Option<String> = row.get(3)?;
            let kind_str: String = row.get(5)?;

            Ok(LedgerEntry {
                txid: row.get(0)?,
                account: Uuid::parse_str(&account_str).unwrap_or_default(),
                amount: row.get(2)?,
                counterparty: counterparty_str.and_then(|c| Uuid::parse_str(&c).ok()),
                timestamp: chrono::DateTime::from_timestamp(row.get(4)?, 0)
                    .unwrap_or_else(Utc::now),
                kind: EntryKind::parse(&kind_str),
            })
        })?;

        let mut entries = Vec::new();
        for entry in entry_iter {
            entries.push(entry?);
        }

        Ok(entries)
    }
}
