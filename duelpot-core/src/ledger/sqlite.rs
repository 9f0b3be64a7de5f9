use crate::error::{DuelpotError, Result};
use crate::ledger::Ledger;
use crate::storage::{EntryStore, Storage};
use crate::types::{Amount, EntryKind, LedgerEntry};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Transaction};
use std::sync::Arc;
use uuid::Uuid;

/// Durable ledger over [`Storage`]. Every mutating call takes the single
/// connection mutex and runs inside one SQL transaction, so operations
/// are serialized and either commit completely or not at all.
pub struct SqliteLedger {
    storage: Arc<Storage>,
}

impl SqliteLedger {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    fn balance_in_tx(tx: &Transaction<'_>, account: Uuid) -> Result<Amount> {
        let balance: Option<u64> = tx
            .query_row(
                "SELECT balance FROM accounts WHERE id = ?1",
                params![account.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        balance
            .map(Amount::from_units)
            .ok_or(DuelpotError::UnknownAccount(account))
    }

    fn set_balance_in_tx(tx: &Transaction<'_>, account: Uuid, balance: Amount) -> Result<()> {
        tx.execute(
            "UPDATE accounts SET balance = ?1 WHERE id = ?2",
            params![balance.to_units(), account.to_string()],
        )?;
        Ok(())
    }

    fn journal_in_tx(tx: &Transaction<'_>, entry: &LedgerEntry) -> Result<()> {
        tx.execute(
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
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn open_account(&self, name: &str) -> Result<Uuid> {
        let account = Uuid::new_v4();
        let conn = self.storage.get_connection().await;

        // Plain INSERT so the UNIQUE name constraint surfaces a conflict
        // instead of silently replacing an existing account.
        conn.execute(
            "INSERT INTO accounts (id, name, balance, created_at)
             VALUES (?1, ?2, 0, ?3)",
            params![account.to_string(), name, Utc::now().timestamp()],
        )?;

        tracing::debug!("Opened ledger account '{}' ({})", name, account);
        Ok(account)
    }

    async fn balance(&self, account: Uuid) -> Result<Amount> {
        let conn = self.storage.get_connection().await;

        let balance: Option<u64> = conn
            .query_row(
                "SELECT balance FROM accounts WHERE id = ?1",
                params![account.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        balance
            .map(Amount::from_units)
            .ok_or(DuelpotError::UnknownAccount(account))
    }

    async fn issue(&self, account: Uuid, amount: Amount) -> Result<String> {
        let txid = Uuid::new_v4().to_string();
        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        let balance = Self::balance_in_tx(&tx, account)?;
        let new_balance = balance
            .checked_add(amount)
            .ok_or(DuelpotError::AmountOverflow)?;

        Self::set_balance_in_tx(&tx, account, new_balance)?;
        Self::journal_in_tx(
            &tx,
            &LedgerEntry {
                txid: txid.clone(),
                account,
                amount: amount.to_units() as i64,
                counterparty: None,
                timestamp: Utc::now(),
                kind: EntryKind::Issue,
            },
        )?;

        tx.commit()?;

        tracing::info!("Issued {} to account {}", amount, account);
        Ok(txid)
    }

    async fn transfer(&self, from: Uuid, to: Uuid, amount: Amount) -> Result<String> {
        let txid = Uuid::new_v4().to_string();
        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        let from_balance = Self::balance_in_tx(&tx, from)?;
        let to_balance = Self::balance_in_tx(&tx, to)?;

        let new_from =
            from_balance
                .checked_sub(amount)
                .ok_or(DuelpotError::InsufficientFunds {
                    need: amount.to_units(),
                    available: from_balance.to_units(),
                })?;
        let new_to = to_balance
            .checked_add(amount)
            .ok_or(DuelpotError::AmountOverflow)?;

        Self::set_balance_in_tx(&tx, from, new_from)?;
        Self::set_balance_in_tx(&tx, to, new_to)?;

        let now = Utc::now();
        Self::journal_in_tx(
            &tx,
            &LedgerEntry {
                txid: txid.clone(),
                account: from,
                amount: -(amount.to_units() as i64),
                counterparty: Some(to),
                timestamp: now,
                kind: EntryKind::Transfer,
            },
        )?;
        Self::journal_in_tx(
            &tx,
            &LedgerEntry {
                txid: txid.clone(),
                account: to,
                amount: amount.to_units() as i64,
                counterparty: Some(from),
                timestamp: now,
                kind: EntryKind::Transfer,
            },
        )?;

        tx.commit()?;

        tracing::info!("Transferred {} from {} to {}", amount, from, to);
        Ok(txid)
    }

    async fn history(&self, account: Uuid) -> Result<Vec<LedgerEntry>> {
        let store = EntryStore::new(&self.storage);
        store.account_history(account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_ledger() -> (tempfile::TempDir, SqliteLedger) {
        let temp_dir = tempdir().unwrap();
        let storage = Arc::new(Storage::new(&temp_dir.path().join("test.db")).await.unwrap());
        (temp_dir, SqliteLedger::new(storage))
    }

    #[tokio::test]
    async fn issue_and_transfer() {
        let (_dir, ledger) = test_ledger().await;

        let alice = ledger.open_account("alice").await.unwrap();
        let bob = ledger.open_account("bob").await.unwrap();

        ledger.issue(alice, Amount::from_units(10)).await.unwrap();
        assert_eq!(ledger.balance(alice).await.unwrap(), Amount::from_units(10));

        ledger
            .transfer(alice, bob, Amount::from_units(4))
            .await
            .unwrap();
        assert_eq!(ledger.balance(alice).await.unwrap(), Amount::from_units(6));
        assert_eq!(ledger.balance(bob).await.unwrap(), Amount::from_units(4));
    }

    #[tokio::test]
    async fn insufficient_funds_moves_nothing() {
        let (_dir, ledger) = test_ledger().await;

        let alice = ledger.open_account("alice").await.unwrap();
        let bob = ledger.open_account("bob").await.unwrap();
        ledger.issue(alice, Amount::from_units(3)).await.unwrap();

        let err = ledger
            .transfer(alice, bob, Amount::from_units(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DuelpotError::InsufficientFunds {
                need: 5,
                available: 3
            }
        ));

        // All-or-nothing: both balances untouched, no journal rows.
        assert_eq!(ledger.balance(alice).await.unwrap(), Amount::from_units(3));
        assert_eq!(ledger.balance(bob).await.unwrap(), Amount::ZERO);
        assert!(ledger.history(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_account_rejected() {
        let (_dir, ledger) = test_ledger().await;

        let alice = ledger.open_account("alice").await.unwrap();
        let ghost = Uuid::new_v4();

        assert!(matches!(
            ledger.balance(ghost).await.unwrap_err(),
            DuelpotError::UnknownAccount(id) if id == ghost
        ));
        assert!(ledger
            .transfer(alice, ghost, Amount::from_units(1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn history_records_both_sides() {
        let (_dir, ledger) = test_ledger().await;

        let alice = ledger.open_account("alice").await.unwrap();
        let bob = ledger.open_account("bob").await.unwrap();
        ledger.issue(alice, Amount::from_units(5)).await.unwrap();
        let txid = ledger
            .transfer(alice, bob, Amount::from_units(2))
            .await
            .unwrap();

        let alice_history = ledger.history(alice).await.unwrap();
        assert_eq!(alice_history.len(), 2);
        assert_eq!(alice_history[1].txid, txid);
        assert_eq!(alice_history[1].amount, -2);
        assert_eq!(alice_history[1].counterparty, Some(bob));

        let bob_history = ledger.history(bob).await.unwrap();
        assert_eq!(bob_history.len(), 1);
        assert_eq!(bob_history[0].amount, 2);
        assert_eq!(bob_history[0].kind, EntryKind::Transfer);
    }

    #[tokio::test]
    async fn duplicate_account_name_rejected() {
        let (_dir, ledger) = test_ledger().await;

        ledger.open_account("alice").await.unwrap();
        assert!(ledger.open_account("alice").await.is_err());
    }
}
