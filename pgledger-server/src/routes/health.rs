//! Status and health endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use pgledger_core::ClientHandle;
use serde::Serialize;

use super::SERVICE_NAME;
use crate::state::AppState;

/// Static liveness response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub service: &'static str,
}

/// Health check response; `failures` is empty when healthy
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub version: &'static str,
    pub service: &'static str,
    pub failures: Vec<String>,
}

/// GET /status
async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "OK",
        version: env!("CARGO_PKG_VERSION"),
        service: SERVICE_NAME,
    })
}

/// GET /health - pings the store through one pooled handle
async fn health<C: ClientHandle + 'static>(
    State(state): State<AppState<C>>,
) -> (StatusCode, Json<HealthResponse>) {
    let mut failures = Vec::new();
    if let Err(e) = state.ledger().ping().await {
        tracing::warn!(error = %e, "health check failed");
        failures.push(format!("database: {e}"));
    }

    let code = if failures.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            version: env!("CARGO_PKG_VERSION"),
            service: SERVICE_NAME,
            failures,
        }),
    )
}

/// Health routes
pub fn router<C: ClientHandle + 'static>() -> Router<AppState<C>> {
    Router::new()
        .route("/status", get(status))
        .route("/health", get(health::<C>))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_returns_ok() {
        let Json(body) = status().await;
        assert_eq!(body.message, "OK");
        assert_eq!(body.service, SERVICE_NAME);
    }
}
