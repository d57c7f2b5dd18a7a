//! Error types and handling for the model router.
//!
//! [`AppError`] covers everything that can go wrong while serving a request
//! and converts into an HTTP response. [`ConfigError`] is startup-only and
//! aborts the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Per-request errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The requested model matches no pool, neither exactly nor by wildcard
    #[error("no pool for model")]
    NoPoolForModel(String),

    /// The outbound request could not be sent or the backend did not answer
    #[error("{0}")]
    BackendUnreachable(reqwest::Error),

    /// One endpoint failed during model aggregation. Logged and skipped.
    #[error("model listing from {endpoint} failed: {reason}")]
    BackendPartialFailure { endpoint: String, reason: String },

    /// The outbound request could not be constructed
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoPoolForModel(_) => StatusCode::BAD_REQUEST,
            AppError::BackendUnreachable(_) | AppError::BackendPartialFailure { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, self.to_string()).into_response()
    }
}

/// Fatal configuration errors raised while loading the pool file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("pool '{name}' has no endpoints")]
    EmptyPool { name: String },
}

/// Convenience type alias for Results using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
