use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record as stored in the `accounts` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Request to open a new account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl NewAccount {
    pub fn new(username: impl Into<String>, email: Option<&str>) -> Self {
        Self {
            username: username.into(),
            email: email.map(str::to_owned),
        }
    }

    /// The email, with an empty string treated as absent.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }
}
