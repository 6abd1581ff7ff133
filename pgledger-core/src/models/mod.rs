//! Ledger records and the input types that create them
//!
//! Field validation lives next to the records it guards. Invalid input
//! returns [`ValidationError`], never a panic.

pub mod account;
pub mod transaction;
pub mod validation;

pub use account::{Account, NewAccount};
pub use transaction::{NewTransaction, Transaction};
pub use validation::{
    validate_account_fields, validate_email, validate_username, ValidationError, EMAIL_PATTERN,
    USERNAME_PATTERN,
};
