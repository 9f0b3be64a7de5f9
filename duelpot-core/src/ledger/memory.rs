use crate::error::{DuelpotError, Result};
use crate::ledger::Ledger;
use crate::types::{Amount, EntryKind, LedgerEntry};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Uuid, MemoryAccount>,
    journal: Vec<LedgerEntry>,
}

struct MemoryAccount {
    name: String,
    balance: Amount,
}

/// In-process ledger for tests and simulations. One write lock
/// serializes all mutations; balance math mirrors [`super::SqliteLedger`].
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<MemoryState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn open_account(&self, name: &str) -> Result<Uuid> {
        let mut state = self.state.write();

        if state.accounts.values().any(|a| a.name == name) {
            return Err(DuelpotError::config(format!(
                "Account '{}' already exists",
                name
            )));
        }

        let account = Uuid::new_v4();
        state.accounts.insert(
            account,
            MemoryAccount {
                name: name.to_string(),
                balance: Amount::ZERO,
            },
        );

        Ok(account)
    }

    async fn balance(&self, account: Uuid) -> Result<Amount> {
        let state = self.state.read();
        state
            .accounts
            .get(&account)
            .map(|a| a.balance)
            .ok_or(DuelpotError::UnknownAccount(account))
    }

    async fn issue(&self, account: Uuid, amount: Amount) -> Result<String> {
        let mut state = self.state.write();

        let entry = state
            .accounts
            .get_mut(&account)
            .ok_or(DuelpotError::UnknownAccount(account))?;
        entry.balance = entry
            .balance
            .checked_add(amount)
            .ok_or(DuelpotError::AmountOverflow)?;

        let txid = Uuid::new_v4().to_string();
        state.journal.push(LedgerEntry {
            txid: txid.clone(),
            account,
            amount: amount.to_units() as i64,
            counterparty: None,
            timestamp: Utc::now(),
            kind: EntryKind::Issue,
        });

        Ok(txid)
    }

    async fn transfer(&self, from: Uuid, to: Uuid, amount: Amount) -> Result<String> {
        let mut state = self.state.write();

        // Validate both sides before touching either balance.
        let from_balance = state
            .accounts
            .get(&from)
            .map(|a| a.balance)
            .ok_or(DuelpotError::UnknownAccount(from))?;
        let to_balance = state
            .accounts
            .get(&to)
            .map(|a| a.balance)
            .ok_or(DuelpotError::UnknownAccount(to))?;

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

        if let Some(a) = state.accounts.get_mut(&from) {
            a.balance = new_from;
        }
        if let Some(a) = state.accounts.get_mut(&to) {
            a.balance = new_to;
        }

        let txid = Uuid::new_v4().to_string();
        let now = Utc::now();
        state.journal.push(LedgerEntry {
            txid: txid.clone(),
            account: from,
            amount: -(amount.to_units() as i64),
            counterparty: Some(to),
            timestamp: now,
            kind: EntryKind::Transfer,
        });
        state.journal.push(LedgerEntry {
            txid: txid.clone(),
            account: to,
            amount: amount.to_units() as i64,
            counterparty: Some(from),
            timestamp: now,
            kind: EntryKind::Transfer,
        });

        Ok(txid)
    }

    async fn history(&self, account: Uuid) -> Result<Vec<LedgerEntry>> {
        let state = self.state.read();
        Ok(state
            .journal
            .iter()
            .filter(|e| e.account == account)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transfer_conserves_supply() {
        let ledger = MemoryLedger::new();
        let a = ledger.open_account("a").await.unwrap();
        let b = ledger.open_account("b").await.unwrap();

        ledger.issue(a, Amount::from_units(7)).await.unwrap();
        ledger.transfer(a, b, Amount::from_units(3)).await.unwrap();

        let total = ledger.balance(a).await.unwrap().to_units()
            + ledger.balance(b).await.unwrap().to_units();
        assert_eq!(total, 7);
    }

    #[tokio::test]
    async fn failed_transfer_is_all_or_nothing() {
        let ledger = MemoryLedger::new();
        let a = ledger.open_account("a").await.unwrap();
        let b = ledger.open_account("b").await.unwrap();
        ledger.issue(a, Amount::from_units(1)).await.unwrap();

        assert!(ledger.transfer(a, b, Amount::from_units(2)).await.is_err());
        assert_eq!(ledger.balance(a).await.unwrap(), Amount::from_units(1));
        assert_eq!(ledger.balance(b).await.unwrap(), Amount::ZERO);
        assert!(ledger.history(b).await.unwrap().is_empty());
    }
}
