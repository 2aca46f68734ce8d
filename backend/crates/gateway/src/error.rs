//! Gateway Error Types
//!
//! Pipeline-stage failures. Every variant integrates with the unified
//! `kernel::error::AppError` system so the fault boundary renders it.

use std::time::Duration;

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Gateway-specific result type alias
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures raised by the request pipeline itself
#[derive(Debug, Error)]
pub enum GatewayError {
    /// JSON or URL-encoded body exceeds the configured limit
    #[error("request entity too large")]
    PayloadTooLarge { limit: usize },

    /// JSON body failed to parse
    #[error("Malformed JSON body: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// Strict JSON: only objects and arrays are accepted at the top level
    #[error("JSON body must be an object or an array")]
    JsonNotObjectOrArray,

    /// Body stream failed before it was fully read
    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    /// Origin header not in the allow-list
    #[error("Not allowed by CORS")]
    OriginNotAllowed(String),

    /// Request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout(Duration),

    /// Session payload could not be encoded or decoded
    #[error("Session encoding error: {0}")]
    SessionEncoding(#[from] serde_json::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stage that another stage depends on is not installed
    #[error("Pipeline misconfigured: {0}")]
    Misconfigured(&'static str),
}

impl GatewayError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            GatewayError::MalformedJson(_)
            | GatewayError::JsonNotObjectOrArray
            | GatewayError::BodyRead(_) => ErrorKind::BadRequest,
            GatewayError::OriginNotAllowed(_) => ErrorKind::Forbidden,
            GatewayError::Timeout(_) => ErrorKind::RequestTimeout,
            GatewayError::Database(_) => ErrorKind::ServiceUnavailable,
            GatewayError::SessionEncoding(_) | GatewayError::Misconfigured(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    fn log(&self) {
        match self {
            GatewayError::OriginNotAllowed(origin) => {
                tracing::debug!(origin = %origin, "Rejected cross-origin request");
            }
            _ => {
                tracing::debug!(error = %self, "Gateway error");
            }
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
