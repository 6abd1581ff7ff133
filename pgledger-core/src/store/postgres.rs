//! PostgreSQL record store
//!
//! Each [`PgClient`] owns exactly one [`PgConnection`]; pooling happens one
//! level up in [`Pool`](crate::pool::Pool), not inside sqlx.
//!
//! Writes run inside `BEGIN .. COMMIT` on the handle's connection.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection;

use super::{ClientHandle, Connector, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{Account, Transaction};

const ACCOUNT_COLUMNS: &str = "id, username, email, balance, created_at";
const TRANSACTION_COLUMNS: &str = "id, from_account, to_account, amount, created_at";

/// Connection parameters for one PostgreSQL database
#[derive(Clone, PartialEq, Eq)]
pub struct PgSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl PgSettings {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(PgSslMode::Disable)
    }
}

impl fmt::Debug for PgSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Opens [`PgClient`] handles from fixed settings.
#[derive(Debug, Clone)]
pub struct PgConnector {
    settings: PgSettings,
}

impl PgConnector {
    pub fn new(settings: PgSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PgSettings {
        &self.settings
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Client = PgClient;

    async fn connect(&self) -> StoreResult<PgClient> {
        let mut conn = PgConnection::connect_with(&self.settings.connect_options()).await?;
        conn.ping().await?;
        tracing::debug!(
            host = %self.settings.host,
            port = self.settings.port,
            database = %self.settings.database,
            "opened postgres connection"
        );
        Ok(PgClient::new(conn))
    }
}

/// Client handle over one PostgreSQL connection.
///
/// After [`ClientHandle::close`] every operation fails with [`StoreError::Closed`].
pub struct PgClient {
    conn: Option<PgConnection>,
}

impl PgClient {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn: Some(conn) }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&mut self) -> StoreResult<&mut PgConnection> {
        self.conn.as_mut().ok_or(StoreError::Closed)
    }
}

#[async_trait]
impl RecordStore for PgClient {
    async fn create_account(
        &mut self,
        username: &str,
        email: Option<&str>,
    ) -> StoreResult<Account> {
        let mut tx = self.conn()?.begin().await?;
        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (username, email, balance) VALUES ($1, $2, 0) RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn create_transaction(
        &mut self,
        from_account: i64,
        to_account: i64,
        amount: i64,
    ) -> StoreResult<Transaction> {
        let mut tx = self.conn()?.begin().await?;
        let row = sqlx::query_as::<_, Transaction>(&format!(
            "INSERT INTO transactions (from_account, to_account, amount) VALUES ($1, $2, $3) RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(from_account)
        .bind(to_account)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn get_account_by_id(&mut self, id: i64) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| StoreError::not_found("account", id))
    }

    async fn get_account_by_username(&mut self, username: &str) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1 ORDER BY id LIMIT 1"
        ))
        .bind(username)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| StoreError::not_found("account", username))
    }

    async fn get_account_by_email(&mut self, email: &str) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1 ORDER BY id LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| StoreError::not_found("account", email))
    }

    async fn get_all_accounts(&mut self) -> StoreResult<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"
        ))
        .fetch_all(self.conn()?)
        .await?;
        Ok(accounts)
    }

    async fn get_transaction_by_id(&mut self, id: i64) -> StoreResult<Transaction> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| StoreError::not_found("transaction", id))
    }

    async fn get_all_transactions(&mut self) -> StoreResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY id"
        ))
        .fetch_all(self.conn()?)
        .await?;
        Ok(rows)
    }

    async fn delete_account(&mut self, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ClientHandle for PgClient {
    async fn ping(&mut self) -> StoreResult<()> {
        self.conn()?.ping().await?;
        Ok(())
    }

    async fn close(&mut self) -> StoreResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }

    async fn initialize_schema(&mut self, migrations: &Path) -> StoreResult<()> {
        let migrator = Migrator::new(migrations).await?;
        migrator.run_direct(self.conn()?).await?;
        Ok(())
    }

    async fn database_exists(&mut self, name: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)",
        )
        .bind(name)
        .fetch_one(self.conn()?)
        .await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: PGLEDGER_TEST_HOST=localhost ... cargo test -p pgledger-core -- --ignored

    fn settings_from_env() -> PgSettings {
        let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.into());
        PgSettings {
            host: var("PGLEDGER_TEST_HOST", "localhost"),
            port: var("PGLEDGER_TEST_PORT", "5432").parse().expect("invalid port"),
            user: var("PGLEDGER_TEST_USER", "root"),
            password: var("PGLEDGER_TEST_PASSWORD", "secret"),
            database: var("PGLEDGER_TEST_DB", "bank"),
        }
    }

    #[test]
    fn debug_masks_password() {
        let settings = PgSettings {
            host: "db".into(),
            port: 5432,
            user: "root".into(),
            password: "hunter2".into(),
            database: "bank".into(),
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));

        let connector = PgConnector::new(settings.clone());
        assert_eq!(connector.settings(), &settings);
        assert!(!format!("{:?}", connector).contains("hunter2"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn round_trip_against_postgres() {
        let mut client = PgConnector::new(settings_from_env())
            .connect()
            .await
            .expect("connect failed");
        client
            .initialize_schema(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../migrations")))
            .await
            .expect("migrations failed");
        assert!(client.database_exists(&settings_from_env().database).await.unwrap());

        let a = client.create_account("pgalice", None).await.unwrap();
        let b = client.create_account("pgbob", Some("bob@example.com")).await.unwrap();
        assert!(b.id > a.id);

        let tx = client.create_transaction(a.id, b.id, 50).await.unwrap();
        let read = client.get_transaction_by_id(tx.id).await.unwrap();
        assert_eq!(read, tx);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn closed_handle_reports_closed() {
        let mut client = PgConnector::new(settings_from_env())
            .connect()
            .await
            .expect("connect failed");
        client.close().await.unwrap();
        client.close().await.unwrap();
        assert!(client.is_closed());
        assert!(matches!(client.ping().await, Err(StoreError::Closed)));
    }
}
