//! Body Parsing Stage
//!
//! Buffers JSON and URL-encoded bodies up to the configured limit, rejects
//! malformed JSON and optionally sanitizes it. The (possibly rewritten)
//! bytes are handed to the inner stages as the new request body.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;

use crate::domain::sanitize::sanitize_json;
use crate::error::{GatewayError, GatewayResult};

/// Body parsing options
#[derive(Debug, Clone, Copy)]
pub struct BodyParsing {
    pub limit: usize,
    pub sanitize: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        Some(BodyKind::Json)
    } else if essence == "application/x-www-form-urlencoded" {
        Some(BodyKind::UrlEncoded)
    } else {
        None
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

async fn read_limited(body: Body, limit: usize) -> GatewayResult<Bytes> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(GatewayError::PayloadTooLarge { limit })
        }
        Err(err) => Err(GatewayError::BodyRead(err.to_string())),
    }
}

/// Strict JSON: only an object or array may appear at the top level
fn parse_json(bytes: &[u8]) -> GatewayResult<Value> {
    let value: Value = serde_json::from_slice(bytes).map_err(GatewayError::MalformedJson)?;
    if value.is_object() || value.is_array() {
        Ok(value)
    } else {
        Err(GatewayError::JsonNotObjectOrArray)
    }
}

/// The buffered body is sent with a fixed length, never chunked
fn set_buffered_length(headers: &mut HeaderMap, len: usize) {
    headers.remove(header::TRANSFER_ENCODING);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
}

pub async fn parse_body(
    State(options): State<BodyParsing>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(kind) = body_kind(req.headers()) else {
        return Ok(next.run(req).await);
    };

    if declared_length(req.headers()).is_some_and(|len| len > options.limit) {
        return Err(GatewayError::PayloadTooLarge {
            limit: options.limit,
        });
    }

    let (mut parts, body) = req.into_parts();
    let mut bytes = read_limited(body, options.limit).await?;

    // An empty JSON body is treated as absent, not malformed
    if kind == BodyKind::Json && !bytes.is_empty() {
        let mut value = parse_json(&bytes)?;

        if options.sanitize && sanitize_json(&mut value) {
            tracing::debug!(path = %parts.uri.path(), "Sanitized request body");
            bytes = serde_json::to_vec(&value)
                .map(Bytes::from)
                .map_err(|e| GatewayError::BodyRead(e.to_string()))?;
        }
    }

    set_buffered_length(&mut parts.headers, bytes.len());

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
