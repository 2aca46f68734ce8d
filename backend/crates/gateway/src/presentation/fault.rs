//! Fault Boundary
//!
//! The single place where failures become responses. Every 4xx/5xx coming
//! out of the inner stages is logged with its full detail and rendered as
//! `{ "success": false, "message": ... }`. Outside development the message
//! is replaced with a generic one.

use std::any::Any;

use axum::Json;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header, response::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::{AppError, ErrorEnvelope, FailureReport};
use thiserror::Error;

/// Bare failure bodies larger than this are not read back for a message
const BARE_BODY_READ_LIMIT: usize = 16 * 1024;

/// Fault boundary settings
#[derive(Debug, Clone, Copy)]
pub struct FaultBoundary {
    /// Show failure messages to clients (development only)
    pub expose_detail: bool,
}

pub async fn fault_boundary(
    State(boundary): State<FaultBoundary>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();

    let report = match parts.extensions.remove::<FailureReport>() {
        Some(report) => report,
        // A handler chose its own JSON failure body
        None if is_json(&parts) => return Response::from_parts(parts, body),
        None => bare_report(status, body).await,
    };

    log_failure(&report, &method, &path);

    let envelope = ErrorEnvelope::for_mode(boundary.expose_detail, report.message);

    let (_, rendered) = Json(envelope).into_response().into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, rendered)
}

fn is_json(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Describe a failure that was not raised as an `AppError`, such as an
/// extractor rejection or a 405 from the router
async fn bare_report(status: StatusCode, body: Body) -> FailureReport {
    let text = to_bytes(body, BARE_BODY_READ_LIMIT)
        .await
        .ok()
        .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    let message = text.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });

    FailureReport {
        status: status.as_u16(),
        detail: message.clone(),
        message,
    }
}

fn log_failure(report: &FailureReport, method: &Method, path: &str) {
    if report.status >= 500 {
        tracing::error!(
            status = report.status,
            method = %method,
            path = %path,
            detail = %report.detail,
            "Request failed"
        );
    } else {
        tracing::warn!(
            status = report.status,
            method = %method,
            path = %path,
            detail = %report.detail,
            "Request rejected"
        );
    }
}

#[derive(Debug, Error)]
#[error("handler panicked: {0}")]
struct HandlerPanic(String);

/// Response for a panicking handler, for `CatchPanicLayer::custom`
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let payload = if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = panic.downcast_ref::<&str>() {
        text.to_string()
    } else {
        "non-string panic payload".to_string()
    };

    AppError::internal("Internal Server Error")
        .with_source(HandlerPanic(payload))
        .into_response()
}

/// Fallback for paths outside every mounted router
pub async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}
