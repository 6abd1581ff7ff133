//! Record store contract and its backends
//!
//! # Design
//!
//! - [`RecordStore`] is the CRUD/read capability set over accounts and transactions
//! - [`ClientHandle`] adds lifecycle operations for one live connection
//! - Every method takes `&mut self`: a handle is never shared, concurrent
//!   callers go through the [`Pool`](crate::pool::Pool)
//! - Stores perform no validation; invariants belong to the [`Ledger`](crate::ledger::Ledger)
//!
//! Backends:
//! - [`postgres`]: parameterized statements against PostgreSQL via sqlx
//! - [`memory`]: ordered maps owned by the handle, for tests and local runs
//!
//! Cancellation: every operation is a future, dropping it aborts the call.

pub mod memory;
pub mod postgres;

use std::path::Path;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{Account, Transaction};

pub use memory::{MemoryClient, MemoryStore};
pub use postgres::{PgClient, PgConnector, PgSettings};

/// Read/write operations on persisted account and transaction state.
#[async_trait]
pub trait RecordStore: Send {
    /// Insert an account with the next ID, zero balance and the current time.
    ///
    /// Duplicates are not rejected here.
    async fn create_account(&mut self, username: &str, email: Option<&str>)
        -> StoreResult<Account>;

    /// Insert a transfer with the next ID and the current time.
    ///
    /// Neither the amount sign nor the endpoints are checked here.
    async fn create_transaction(
        &mut self,
        from_account: i64,
        to_account: i64,
        amount: i64,
    ) -> StoreResult<Transaction>;

    async fn get_account_by_id(&mut self, id: i64) -> StoreResult<Account>;

    /// First account (lowest ID) registered under `username`.
    async fn get_account_by_username(&mut self, username: &str) -> StoreResult<Account>;

    /// First account (lowest ID) registered under `email`.
    async fn get_account_by_email(&mut self, email: &str) -> StoreResult<Account>;

    /// All accounts, ascending by ID.
    async fn get_all_accounts(&mut self) -> StoreResult<Vec<Account>>;

    async fn get_transaction_by_id(&mut self, id: i64) -> StoreResult<Transaction>;

    /// Every transaction row, ascending by ID.
    ///
    /// There is no per-account pushdown; callers filter by endpoint.
    async fn get_all_transactions(&mut self) -> StoreResult<Vec<Transaction>>;

    /// Remove an account. Removing an absent account succeeds.
    async fn delete_account(&mut self, id: i64) -> StoreResult<()>;
}

/// One live connection to a record store plus its lifecycle.
#[async_trait]
pub trait ClientHandle: RecordStore {
    /// Liveness probe
    async fn ping(&mut self) -> StoreResult<()>;

    /// Release the underlying connection. Safe to call more than once.
    async fn close(&mut self) -> StoreResult<()>;

    /// Apply the migration scripts found in `migrations` to reach the current schema.
    async fn initialize_schema(&mut self, migrations: &Path) -> StoreResult<()>;

    /// Whether the named database exists on the server this handle talks to.
    async fn database_exists(&mut self, name: &str) -> StoreResult<bool>;
}

/// Opens new client handles for the [`Pool`](crate::pool::Pool).
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: ClientHandle;

    async fn connect(&self) -> StoreResult<Self::Client>;
}
