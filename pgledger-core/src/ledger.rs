//! Ledger operations - invariant enforcement above the record store
//!
//! Each store round-trip borrows its own handle from the pool. Account
//! creation is therefore three separate steps (username probe, email
//! probe, insert) with no atomic "insert if absent": two concurrent
//! creations of the same username can both pass the probe and both
//! insert. The shipped schema carries no UNIQUE constraint to catch this.
//!
//! Recording a transaction does not move money. Account balances stay at
//! their creation value until balance bookkeeping is implemented.

use std::path::Path;

use crate::error::{LedgerError, Result, StoreError};
use crate::models::{
    validate_account_fields, validate_email, validate_username, Account, NewAccount,
    NewTransaction, Transaction, ValidationError,
};
use crate::pool::{Pool, PooledClient};
use crate::store::{ClientHandle, RecordStore};

/// Invariant-enforcing entry point for accounts and transfers.
pub struct Ledger<C> {
    pool: Pool<C>,
}

impl<C: ClientHandle> Ledger<C> {
    pub fn new(pool: Pool<C>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<C> {
        &self.pool
    }

    async fn checkout(&self) -> Result<PooledClient<C>> {
        Ok(self.pool.acquire().await?)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Open an account after validating fields and probing for duplicates.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] for an empty or malformed username, or a malformed email
    /// - [`LedgerError::Conflict`] when the username or email is already registered
    /// - [`LedgerError::Connectivity`] when the store fails
    pub async fn create_account(&self, req: &NewAccount) -> Result<Account> {
        if req.username.is_empty() {
            return Err(ValidationError::Empty { field: "username" }.into());
        }
        let email = req.email();
        validate_account_fields(&req.username, email.unwrap_or_default())?;

        let by_username = {
            let mut client = self.checkout().await?;
            client.get_account_by_username(&req.username).await
        };
        if exists(by_username)? {
            return Err(LedgerError::conflict("username already exists"));
        }

        if let Some(email) = email {
            let by_email = {
                let mut client = self.checkout().await?;
                client.get_account_by_email(email).await
            };
            if exists(by_email)? {
                return Err(LedgerError::conflict("email already exists"));
            }
        }

        let account = {
            let mut client = self.checkout().await?;
            client.create_account(&req.username, email).await?
        };
        tracing::debug!(id = account.id, username = %account.username, "account created");
        Ok(account)
    }

    /// Record a transfer between two existing, distinct accounts.
    ///
    /// Balances are left untouched.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] for a non-positive amount, a self-transfer or
    ///   an endpoint that does not exist; no transaction ID is allocated
    /// - [`LedgerError::Connectivity`] when the store fails
    pub async fn create_transaction(&self, req: &NewTransaction) -> Result<Transaction> {
        if req.amount <= 0 {
            return Err(ValidationError::NonPositiveAmount { amount: req.amount }.into());
        }
        if req.from_account == req.to_account {
            return Err(ValidationError::SelfTransfer {
                account: req.from_account,
            }
            .into());
        }

        for (role, id) in [("from", req.from_account), ("to", req.to_account)] {
            self.require_endpoint(role, id).await?;
        }

        let tx = {
            let mut client = self.checkout().await?;
            client
                .create_transaction(req.from_account, req.to_account, req.amount)
                .await?
        };
        tracing::debug!(
            id = tx.id,
            from = tx.from_account,
            to = tx.to_account,
            amount = tx.amount,
            "transaction recorded"
        );
        Ok(tx)
    }

    async fn require_endpoint(&self, role: &'static str, id: i64) -> Result<()> {
        let lookup = {
            let mut client = self.checkout().await?;
            client.get_account_by_id(id).await
        };
        match lookup {
            Ok(account) if account.id != 0 => Ok(()),
            Ok(_) => Err(ValidationError::UnknownAccount {
                role,
                id,
                reason: LedgerError::not_found("account", id).to_string(),
            }
            .into()),
            Err(e @ StoreError::NotFound { .. }) => Err(ValidationError::UnknownAccount {
                role,
                id,
                reason: e.to_string(),
            }
            .into()),
            Err(e) => Err(LedgerError::Connectivity(e)),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn account(&self, id: i64) -> Result<Account> {
        require_id("id", id)?;
        let mut client = self.checkout().await?;
        found(client.get_account_by_id(id).await?, id)
    }

    pub async fn account_by_username(&self, username: &str) -> Result<Account> {
        if username.is_empty() {
            return Err(ValidationError::Empty { field: "username" }.into());
        }
        validate_username(username)?;
        let mut client = self.checkout().await?;
        found(client.get_account_by_username(username).await?, username)
    }

    pub async fn account_by_email(&self, email: &str) -> Result<Account> {
        if email.is_empty() {
            return Err(ValidationError::Empty { field: "email" }.into());
        }
        validate_email(email)?;
        let mut client = self.checkout().await?;
        found(client.get_account_by_email(email).await?, email)
    }

    /// All accounts, ascending by ID
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        let mut client = self.checkout().await?;
        Ok(client.get_all_accounts().await?)
    }

    pub async fn transaction(&self, id: i64) -> Result<Transaction> {
        require_id("id", id)?;
        let mut client = self.checkout().await?;
        Ok(client.get_transaction_by_id(id).await?)
    }

    /// Transactions where `account` is sender or recipient, ascending by ID.
    ///
    /// Filtering happens here, over the full transaction list.
    pub async fn transactions_for_account(&self, account: i64) -> Result<Vec<Transaction>> {
        require_id("account", account)?;
        let rows = {
            let mut client = self.checkout().await?;
            client.get_all_transactions().await?
        };
        Ok(rows.into_iter().filter(|tx| tx.involves(account)).collect())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Liveness probe through one pooled handle
    pub async fn ping(&self) -> Result<()> {
        let mut client = self.checkout().await?;
        client.ping().await.map_err(LedgerError::Connectivity)
    }

    pub async fn database_exists(&self, name: &str) -> Result<bool> {
        let mut client = self.checkout().await?;
        client
            .database_exists(name)
            .await
            .map_err(LedgerError::Connectivity)
    }

    /// Migrate the schema using the scripts in `migrations`.
    pub async fn initialize_schema(&self, migrations: &Path) -> Result<()> {
        let mut client = self.checkout().await?;
        client
            .initialize_schema(migrations)
            .await
            .map_err(LedgerError::Connectivity)
    }

    /// Close every pooled handle.
    pub async fn close(&self) -> Result<()> {
        self.pool.close_all().await.map_err(LedgerError::Connectivity)
    }
}

/// Interpret a uniqueness probe: a row with a real ID means taken.
fn exists(probe: std::result::Result<Account, StoreError>) -> Result<bool> {
    match probe {
        Ok(account) => Ok(account.id != 0),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(LedgerError::Connectivity(e)),
    }
}

/// A zero ID is a degenerate lookup result and counts as not found.
fn found(account: Account, key: impl ToString) -> Result<Account> {
    if account.id == 0 {
        return Err(LedgerError::not_found("account", key));
    }
    Ok(account)
}

fn require_id(field: &'static str, id: i64) -> Result<()> {
    if id < 1 {
        return Err(ValidationError::InvalidId { field, id }.into());
    }
    Ok(())
}
