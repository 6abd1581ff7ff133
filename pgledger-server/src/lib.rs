//! pgledger-server - HTTP service over the ledger
//!
//! Exposes account and transfer operations as JSON endpoints, backed by
//! either the PostgreSQL or the in-memory record store.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Backend, Config, ConfigError, LogFormat, LogLevel};
pub use error::{ApiError, ServerError};
pub use server::{build_router, migrate, run};
pub use state::AppState;
