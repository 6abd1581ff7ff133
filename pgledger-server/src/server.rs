//! HTTP server setup and lifecycle
//!
//! Startup order:
//! 1. build the pool (every handle or none)
//! 2. check the configured database exists
//! 3. apply migrations; a failure is logged and startup continues
//! 4. wrap the pool in a [`Ledger`] and serve it
//!
//! On Ctrl+C or SIGTERM the listener drains and every pooled handle is closed.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use pgledger_core::{ClientHandle, Ledger, MemoryClient, PgConnector, Pool, PoolError};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::{Backend, Config};
use crate::error::ServerError;
use crate::routes;
use crate::state::AppState;

/// Build the router with every route and the middleware stack.
pub fn build_router<C: ClientHandle + 'static>(state: AppState<C>, timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors);

    Router::new()
        .merge(routes::health::router::<C>())
        .merge(routes::accounts::router::<C>())
        .merge(routes::transactions::router::<C>())
        .with_state(state)
        .layer(middleware)
}

/// Pool for the in-memory backend. Always one handle, since a memory
/// store is owned by exactly one client.
pub fn memory_pool(config: &Config) -> Result<Pool<MemoryClient>, PoolError> {
    if config.max_threads == 0 {
        return Err(PoolError::ZeroSize);
    }
    if config.max_threads > 1 {
        warn!(
            max_threads = config.max_threads,
            "memory backend holds a single store; using one client"
        );
    }
    Pool::from_clients(vec![MemoryClient::new()])
}

/// Check the database and migrate the schema through an already built ledger.
pub async fn prepare<C: ClientHandle>(ledger: &Ledger<C>, config: &Config) -> Result<(), ServerError> {
    let exists = ledger.database_exists(&config.postgres_db).await?;
    if !exists {
        return Err(ServerError::MissingDatabase(config.postgres_db.clone()));
    }
    info!(database = %config.postgres_db, "database exists");

    match ledger.initialize_schema(&config.migrations_path).await {
        Ok(()) => info!(path = %config.migrations_path.display(), "schema up to date"),
        Err(e) => warn!(
            error = %e,
            path = %config.migrations_path.display(),
            "failed to initialize schema, continuing"
        ),
    }
    Ok(())
}

/// Build the configured backend and serve until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<(), ServerError> {
    match config.backend {
        Backend::Postgres => {
            let connector = PgConnector::new(config.pg_settings());
            let pool = Pool::connect(&connector, config.max_threads).await?;
            serve(Ledger::new(pool), &config).await
        }
        Backend::Memory => {
            let pool = memory_pool(&config)?;
            serve(Ledger::new(pool), &config).await
        }
    }
}

/// Apply migrations through a single handle, failing on any error.
pub async fn migrate(config: &Config) -> Result<(), ServerError> {
    if config.backend == Backend::Memory {
        info!("memory backend has no schema to migrate");
        return Ok(());
    }

    let connector = PgConnector::new(config.pg_settings());
    let pool = Pool::connect(&connector, 1).await?;
    let ledger = Ledger::new(pool);

    let result = async {
        if !ledger.database_exists(&config.postgres_db).await? {
            return Err(ServerError::MissingDatabase(config.postgres_db.clone()));
        }
        ledger.initialize_schema(&config.migrations_path).await?;
        Ok(())
    }
    .await;

    if let Err(e) = ledger.close().await {
        warn!(error = %e, "failed to close client after migration");
    }
    result?;

    info!(path = %config.migrations_path.display(), "migrations applied");
    Ok(())
}

async fn serve<C: ClientHandle + 'static>(ledger: Ledger<C>, config: &Config) -> Result<(), ServerError> {
    prepare(&ledger, config).await?;

    let state = AppState::new(ledger);
    let app = build_router(
        state.clone(),
        Duration::from_secs(config.request_timeout_secs),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        backend = %config.backend,
        clients = state.ledger().pool().size(),
        "pgledger listening on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = state.ledger().close().await {
        warn!(error = %e, "failed to close pooled clients");
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn memory_app() -> Router {
        let pool = memory_pool(&Config::default()).unwrap();
        build_router(AppState::new(Ledger::new(pool)), Duration::from_secs(5))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read(response).await
    }

    async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        read(response).await
    }

    async fn read(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn status_and_health() {
        let app = memory_app();

        let (status, body) = get(&app, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "OK");
        assert_eq!(body["service"], "pgledger");

        let (status, body) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["failures"], json!([]));
    }

    #[tokio::test]
    async fn create_and_look_up_account() {
        let app = memory_app();

        let (status, body) = post(
            &app,
            "/create-account",
            json!({"username": "alice", "email": "alice@example.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["balance"], 0);

        let (status, body) = get(&app, "/account-by-username?username=alice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "alice@example.com");

        let (status, body) = get(&app, "/account-by-email?email=alice@example.com").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        let (_, body) = post(&app, "/create-account", json!({"username": "bob"})).await;
        assert_eq!(body["id"], 2);
        assert_eq!(body["email"], "");

        let (status, body) = get(&app, "/accounts").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn account_errors_map_to_status_codes() {
        let app = memory_app();
        post(&app, "/create-account", json!({"username": "alice"})).await;

        let (status, body) = post(&app, "/create-account", json!({"username": "alice"})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "username already exists");

        let (status, body) = post(&app, "/create-account", json!({"username": "bad name"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = get(&app, "/account-by-index?id=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(&app, "/account-by-index?id=99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = get(&app, "/account-by-username").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transfers_and_history() {
        let app = memory_app();
        post(&app, "/create-account", json!({"username": "alice"})).await;
        post(&app, "/create-account", json!({"username": "bob"})).await;
        post(&app, "/create-account", json!({"username": "carol"})).await;

        let (status, body) = post(
            &app,
            "/create-tx",
            json!({"from_account": 1, "to_account": 2, "amount": 100}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["amount"], 100);

        post(
            &app,
            "/create-tx",
            json!({"from_account": 2, "to_account": 3, "amount": 5}),
        )
        .await;

        let (status, body) = get(&app, "/tx-by-index?id=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["from_account"], 1);

        let (_, body) = get(&app, "/tx-history?account=3").await;
        let history = body.as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["id"], 2);

        let (status, _) = post(
            &app,
            "/create-tx",
            json!({"from_account": 1, "to_account": 1, "amount": 10}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(
            &app,
            "/create-tx",
            json!({"from_account": 1, "to_account": 42, "amount": 10}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(&app, "/tx-by-index?id=3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn prepare_accepts_memory_backend() {
        let ledger = Ledger::new(memory_pool(&Config::default()).unwrap());
        prepare(&ledger, &Config::default()).await.unwrap();
    }

    #[test]
    fn memory_pool_has_one_client() {
        let config = Config {
            max_threads: 8,
            ..Config::default()
        };
        assert_eq!(memory_pool(&config).unwrap().size(), 1);

        let config = Config {
            max_threads: 0,
            ..Config::default()
        };
        assert!(matches!(memory_pool(&config), Err(PoolError::ZeroSize)));
    }
}
