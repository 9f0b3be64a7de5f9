use crate::account::Account;
use crate::error::{DuelpotError, Result};
use crate::storage::account_store::AccountData;
use crate::storage::{AccountStore, Storage};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// High-level named-account API over [`Storage`], with an in-process
/// cache of resolved accounts.
pub struct AccountManager {
    storage: Arc<Storage>,
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl AccountManager {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn storage(&self) -> Arc<Storage> {
        self.storage.clone()
    }

    pub async fn create_account(&self, name: &str) -> Result<Account> {
        // Check if account already exists
        let store = AccountStore::new(&self.storage);
        if store.account_exists(name).await? {
            return Err(DuelpotError::config(format!(
                "Account '{}' already exists",
                name
            )));
        }

        let account = Account {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        store
            .save_account(&AccountData {
                id: account.id.to_string(),
                name: account.name.clone(),
                balance: 0,
                created_at: account.created_at,
            })
            .await?;

        // Cache the account
        {
            let mut accounts = self.accounts.write();
            accounts.insert(account.id, account.clone());
        }

        tracing::info!("Created account '{}' with ID: {}", name, account.id);
        Ok(account)
    }

    pub async fn load_account(&self, name: &str) -> Result<Account> {
        // Check cache first
        {
            let accounts = self.accounts.read();
            for account in accounts.values() {
                if account.name == name {
                    return Ok(account.clone());
                }
            }
        }

        // Load from storage
        let store = AccountStore::new(&self.storage);
        let accounts_data = store.list_accounts().await?;

        let data = accounts_data
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| DuelpotError::AccountNotFound {
                name: name.to_string(),
            })?;

        let account = Account {
            id: Uuid::parse_str(&data.id)
                .map_err(|e| DuelpotError::internal(format!("Corrupt account id: {}", e)))?,
            name: data.name,
            created_at: data.created_at,
        };

        // Cache the account
        {
            let mut accounts = self.accounts.write();
            accounts.insert(account.id, account.clone());
        }

        Ok(account)
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let store = AccountStore::new(&self.storage);
        let accounts_data = store.list_accounts().await?;

        accounts_data
            .into_iter()
            .map(|data| {
                Ok(Account {
                    id: Uuid::parse_str(&data.id)
                        .map_err(|e| DuelpotError::internal(format!("Corrupt account id: {}", e)))?,
                    name: data.name,
                    created_at: data.created_at,
                })
            })
            .collect()
    }

    pub async fn delete_account(&self, name: &str) -> Result<()> {
        let account = self.load_account(name).await?;

        // Remove from cache
        {
            let mut accounts = self.accounts.write();
            accounts.remove(&account.id);
        }

        let store = AccountStore::new(&self.storage);
        store.delete_account(&account.id.to_string()).await?;

        tracing::info!("Deleted account '{}'", name);
        Ok(())
    }
}
