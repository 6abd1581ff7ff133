//! Error types for the HTTP service
//!
//! [`ApiError`] is what handlers return; it maps the ledger's error
//! taxonomy onto status codes and a `{"error", "message"}` JSON body.
//! [`ServerError`] covers startup and shutdown.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pgledger_core::{LedgerError, PoolError, StoreError, ValidationError};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Username or email already taken (409)
    Conflict(String),

    /// Resource not found (404)
    NotFound { resource: &'static str, key: String },

    /// Store unreachable or failing (500, logged)
    Database(StoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::Conflict(message) => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::NotFound { resource, key } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, key)
                }),
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(e) => Self::Validation(e),
            LedgerError::Conflict(message) => Self::Conflict(message),
            LedgerError::NotFound { resource, key } => Self::NotFound { resource, key },
            LedgerError::Connectivity(e) => Self::Database(e),
        }
    }
}

/// Errors that stop the service from starting or shutting down cleanly
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("database {0} does not exist")]
    MissingDatabase(String),
}
