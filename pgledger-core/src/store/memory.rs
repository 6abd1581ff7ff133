//! In-memory record store
//!
//! The maps are owned by one [`MemoryClient`] and carry no locking of
//! their own; concurrent callers are serialized by the pool. Schema,
//! ping and close are no-ops.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;

use super::{ClientHandle, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{Account, Transaction};

/// Accounts and transactions keyed by ID.
///
/// IDs are `count + 1` at insertion time and are never handed out twice,
/// even after [`RecordStore::delete_account`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    accounts: BTreeMap<i64, Account>,
    transactions: BTreeMap<i64, Transaction>,
    last_account_id: i64,
    last_transaction_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

/// Client handle over an owned [`MemoryStore`].
#[derive(Debug, Default)]
pub struct MemoryClient {
    store: MemoryStore,
}

impl MemoryClient {
    /// Handle over a fresh, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle over an existing store
    pub fn with_store(store: MemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn into_store(self) -> MemoryStore {
        self.store
    }
}

#[async_trait]
impl RecordStore for MemoryClient {
    async fn create_account(
        &mut self,
        username: &str,
        email: Option<&str>,
    ) -> StoreResult<Account> {
        let store = &mut self.store;
        store.last_account_id += 1;
        let account = Account {
            id: store.last_account_id,
            username: username.to_owned(),
            email: email.map(str::to_owned),
            balance: 0,
            created_at: Utc::now(),
        };
        store.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn create_transaction(
        &mut self,
        from_account: i64,
        to_account: i64,
        amount: i64,
    ) -> StoreResult<Transaction> {
        let store = &mut self.store;
        store.last_transaction_id += 1;
        let tx = Transaction {
            id: store.last_transaction_id,
            from_account,
            to_account,
            amount,
            created_at: Utc::now(),
        };
        store.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn get_account_by_id(&mut self, id: i64) -> StoreResult<Account> {
        self.store
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("account", id))
    }

    async fn get_account_by_username(&mut self, username: &str) -> StoreResult<Account> {
        self.store
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned()
            .ok_or_else(|| StoreError::not_found("account", username))
    }

    async fn get_account_by_email(&mut self, email: &str) -> StoreResult<Account> {
        self.store
            .accounts
            .values()
            .find(|a| a.email.as_deref() == Some(email))
            .cloned()
            .ok_or_else(|| StoreError::not_found("account", email))
    }

    async fn get_all_accounts(&mut self) -> StoreResult<Vec<Account>> {
        Ok(self.store.accounts.values().cloned().collect())
    }

    async fn get_transaction_by_id(&mut self, id: i64) -> StoreResult<Transaction> {
        self.store
            .transactions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("transaction", id))
    }

    async fn get_all_transactions(&mut self) -> StoreResult<Vec<Transaction>> {
        Ok(self.store.transactions.values().cloned().collect())
    }

    async fn delete_account(&mut self, id: i64) -> StoreResult<()> {
        self.store.accounts.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ClientHandle for MemoryClient {
    async fn ping(&mut self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&mut self) -> StoreResult<()> {
        Ok(())
    }

    async fn initialize_schema(&mut self, _migrations: &Path) -> StoreResult<()> {
        Ok(())
    }

    async fn database_exists(&mut self, _name: &str) -> StoreResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_account_then_lookup() {
        let mut client = MemoryClient::new();
        let created = client
            .create_account("testuser", Some("test@example.com"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.balance, 0);

        let by_email = client.get_account_by_email("test@example.com").await.unwrap();
        assert_eq!(by_email, created);

        let by_name = client.get_account_by_username("testuser").await.unwrap();
        assert_eq!(by_name, created);

        let by_id = client.get_account_by_id(1).await.unwrap();
        assert_eq!(by_id, created);
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let mut client = MemoryClient::new();
        assert!(client.get_account_by_id(1).await.unwrap_err().is_not_found());
        assert!(client.get_account_by_username("nobody").await.unwrap_err().is_not_found());
        assert!(client.get_transaction_by_id(1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn empty_email_never_matches_accounts_without_email() {
        let mut client = MemoryClient::new();
        client.create_account("noemail", None).await.unwrap();

        let err = client.get_account_by_email("").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn store_does_not_validate_transactions() {
        let mut client = MemoryClient::new();
        let tx = client.create_transaction(1, 2, 100).await.unwrap();
        assert_eq!((tx.id, tx.from_account, tx.to_account, tx.amount), (1, 1, 2, 100));

        let read = client.get_transaction_by_id(1).await.unwrap();
        assert_eq!(read, tx);

        // Same endpoint, negative amount: accepted at this layer
        let tx = client.create_transaction(5, 5, -3).await.unwrap();
        assert_eq!(tx.id, 2);
    }

    #[tokio::test]
    async fn username_lookup_returns_lowest_id() {
        let mut client = MemoryClient::new();
        client.create_account("dup", None).await.unwrap();
        client.create_account("dup", None).await.unwrap();

        let found = client.get_account_by_username("dup").await.unwrap();
        assert_eq!(found.id, 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_ids_are_not_reused() {
        let mut client = MemoryClient::new();
        client.delete_account(1).await.unwrap();

        client.create_account("a", None).await.unwrap();
        client.create_account("b", None).await.unwrap();
        client.delete_account(2).await.unwrap();
        client.delete_account(2).await.unwrap();

        let c = client.create_account("c", None).await.unwrap();
        assert_eq!(c.id, 3);

        let ids: Vec<i64> = client
            .get_all_accounts()
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn store_carries_over_to_a_new_handle() {
        let mut client = MemoryClient::new();
        client.create_account("a", None).await.unwrap();
        client.create_transaction(1, 1, 5).await.unwrap();

        let store = client.into_store();
        assert_eq!(store.account_count(), 1);
        assert_eq!(store.transaction_count(), 1);

        let mut reopened = MemoryClient::with_store(store);
        let b = reopened.create_account("b", None).await.unwrap();
        assert_eq!(b.id, 2);
        let tx = reopened.create_transaction(1, 2, 5).await.unwrap();
        assert_eq!(tx.id, 2);
        assert_eq!(reopened.store().transaction_count(), 2);
    }

    #[tokio::test]
    async fn lifecycle_operations_are_noops() {
        let mut client = MemoryClient::new();
        client.ping().await.unwrap();
        client.initialize_schema(Path::new("/does/not/exist")).await.unwrap();
        assert!(client.database_exists("bank").await.unwrap());
        client.close().await.unwrap();
        client.close().await.unwrap();
        client.ping().await.unwrap();
    }
}
