use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Transfer record as stored in the `transactions` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub from_account: i64,
    pub to_account: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// True when `account` is either endpoint of the transfer.
    pub fn involves(&self, account: i64) -> bool {
        self.from_account == account || self.to_account == account
    }
}

/// Request to record a transfer between two accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub from_account: i64,
    pub to_account: i64,
    pub amount: i64,
}

impl NewTransaction {
    pub fn new(from_account: i64, to_account: i64, amount: i64) -> Self {
        Self {
            from_account,
            to_account,
            amount,
        }
    }
}
