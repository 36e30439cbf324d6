//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    // Store errors, mapped by kind
    #[error(transparent)]
    Store(#[from] StoreError),

    // Server errors (5xx)
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 404 Not Found
            AppError::BookNotFound(id) => {
                (StatusCode::NOT_FOUND, "book_not_found", Some(id.clone()))
            }
            AppError::TransactionNotFound(id) => {
                (StatusCode::NOT_FOUND, "transaction_not_found", Some(id.clone()))
            }

            AppError::Store(store_err) => match store_err {
                StoreError::NotFound { id, .. } => {
                    (StatusCode::NOT_FOUND, "not_found", Some(id.clone()))
                }
                misuse if misuse.is_misuse() => {
                    (StatusCode::BAD_REQUEST, "invalid_request", Some(misuse.to_string()))
                }
                _ => {
                    tracing::error!("Store error: {:?}", store_err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
            },

            // 500 Internal Server Error
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl AppError {
    /// Turn a zero-row lookup into the entity-specific not-found error
    pub fn book_lookup(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => AppError::BookNotFound(id),
            other => AppError::Store(other),
        }
    }

    pub fn transaction_lookup(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => AppError::TransactionNotFound(id),
            other => AppError::Store(other),
        }
    }
}
