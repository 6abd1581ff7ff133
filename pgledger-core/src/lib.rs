//! pgledger-core: data-access layer for the pgledger service
//!
//! - **store**: the record store contract with PostgreSQL and in-memory backends
//! - **pool**: fixed-size pool serializing access to client handles
//! - **ledger**: account and transfer invariants layered over the pool

pub mod error;
pub mod ledger;
pub mod models;
pub mod pool;
pub mod store;

pub use error::{LedgerError, PoolError, Result, StoreError, StoreResult};
pub use ledger::Ledger;
pub use models::{Account, NewAccount, NewTransaction, Transaction, ValidationError};
pub use pool::{Pool, PooledClient};
pub use store::{
    ClientHandle, Connector, MemoryClient, MemoryStore, PgClient, PgConnector, PgSettings,
    RecordStore,
};
