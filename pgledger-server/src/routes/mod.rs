//! Route handlers for the ledger service
//!
//! Organized by resource type:
//! - health: Status and health endpoints
//! - accounts: Account lookup and creation
//! - transactions: Transfer lookup, history and creation
//!
//! Every router is generic over the client handle type, so the same
//! handlers serve both record store backends.

pub mod accounts;
pub mod health;
pub mod transactions;

/// Service name reported by `/status` and `/health`
pub const SERVICE_NAME: &str = "pgledger";
