//! HTTP error types and implementations

#[cfg(feature = "server")]
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the gated site server
#[derive(Error, Debug)]
pub enum HttpError {
    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Server could not be configured as requested
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while serving
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(feature = "server")]
impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            HttpError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            HttpError::InvalidConfiguration(_)
            | HttpError::Bind { .. }
            | HttpError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_server_error"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using HttpError
pub type Result<T> = std::result::Result<T, HttpError>;
