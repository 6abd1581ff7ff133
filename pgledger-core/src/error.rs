/// Structured error types for pgledger-core.
///
/// Three layers, matching the three places a failure can originate:
/// - [`StoreError`]: raw failures surfaced by a record store backend
/// - [`PoolError`]: failures while building the connection pool
/// - [`LedgerError`]: the caller-visible taxonomy returned by ledger operations
use thiserror::Error;

use crate::models::ValidationError;

/// Raw error surfaced by a [`RecordStore`](crate::store::RecordStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No row matched the lookup
    #[error("not found: {resource} '{key}'")]
    NotFound { resource: &'static str, key: String },

    /// Query or connection failure reported by the relational engine
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// The handle (or the pool holding it) has been closed
    #[error("connection is closed")]
    Closed,
}

/// Result type alias for record store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Create a not-found error for `resource` identified by `key`
    pub fn not_found(resource: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            resource,
            key: key.to_string(),
        }
    }

    /// True when the error only signals a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Error raised while constructing a [`Pool`](crate::pool::Pool).
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("pool size must be at least 1")]
    ZeroSize,

    #[error("failed to open connection {index}: {source}")]
    Connect {
        index: usize,
        #[source]
        source: StoreError,
    },
}

/// Caller-visible error returned by [`Ledger`](crate::ledger::Ledger) operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Bad input shape or value; never retried
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    /// No matching row
    #[error("{resource} '{key}' not found")]
    NotFound { resource: &'static str, key: String },

    /// Backend unreachable or failing; callers may retry with backoff
    #[error("store unavailable: {0}")]
    Connectivity(#[source] StoreError),
}

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a not-found error
    pub fn not_found(resource: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            resource,
            key: key.to_string(),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { resource, key } => Self::NotFound { resource, key },
            other => Self::Connectivity(other),
        }
    }
}
