//! Validation error types and field patterns

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Usernames are plain alphanumerics, e.g. `user105`
pub const USERNAME_PATTERN: &str = "^[a-zA-Z0-9]+$";

/// Simple `local@domain.tld` addresses, e.g. `alex@emailprovider.com`
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(USERNAME_PATTERN).expect("invalid username regex"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("invalid email regex"));

/// Validation error for ledger input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field doesn't match its required pattern
    InvalidFormat {
        field: &'static str,
        value: String,
        pattern: &'static str,
    },

    /// Identifier outside the assignable range (IDs start at 1)
    InvalidId { field: &'static str, id: i64 },

    /// Transfer amount is zero or negative
    NonPositiveAmount { amount: i64 },

    /// Transfer from an account to itself
    SelfTransfer { account: i64 },

    /// Transfer endpoint does not reference an existing account
    UnknownAccount {
        role: &'static str,
        id: i64,
        reason: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::InvalidFormat {
                field,
                value,
                pattern,
            } => write!(
                f,
                "invalid {}: '{}' failed to match expression '{}'",
                field, value, pattern
            ),
            Self::InvalidId { field, id } => {
                write!(f, "{} must be a positive integer, got {}", field, id)
            }
            Self::NonPositiveAmount { amount } => {
                write!(f, "cannot send non-positive amount '{}'", amount)
            }
            Self::SelfTransfer { account } => {
                write!(f, "cannot transfer from account {} to itself", account)
            }
            Self::UnknownAccount { role, id, reason } => {
                write!(f, "{} account {} does not exist: {}", role, id, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn check_pattern(
    field: &'static str,
    value: &str,
    re: &Regex,
    pattern: &'static str,
) -> Result<(), ValidationError> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field,
            value: value.to_owned(),
            pattern,
        })
    }
}

/// Check a username against [`USERNAME_PATTERN`]. Empty input passes.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Ok(());
    }
    check_pattern("username", username, &USERNAME_RE, USERNAME_PATTERN)
}

/// Check an email against [`EMAIL_PATTERN`]. Empty input passes.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Ok(());
    }
    check_pattern("email", email, &EMAIL_RE, EMAIL_PATTERN)
}

/// Validate the optional account fields. Email is checked first.
pub fn validate_account_fields(username: &str, email: &str) -> Result<(), ValidationError> {
    validate_email(email)?;
    validate_username(username)
}
