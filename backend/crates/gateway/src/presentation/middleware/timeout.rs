//! Request Timeout Stage

use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::GatewayError;

pub async fn enforce_timeout(
    State(limit): State<Duration>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let path = req.uri().path().to_owned();

    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => Ok(response),
        Err(_) => {
            tracing::warn!(path = %path, timeout_secs = limit.as_secs(), "Request timed out");
            Err(GatewayError::Timeout(limit))
        }
    }
}
