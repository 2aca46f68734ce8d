//! Origin Enforcement and CORS

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::domain::origin::{ALLOWED_HEADERS, ALLOWED_METHODS, OriginDecision, OriginPolicy};
use crate::error::GatewayError;

/// Reject browser requests from origins outside the allow-list
///
/// Requests without an `Origin` header are never rejected here.
pub async fn enforce_origin(
    State(policy): State<Arc<OriginPolicy>>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    // A header that is not visible ASCII cannot match any allowed origin
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .map(|value| value.to_str().unwrap_or_default());

    match policy.check(origin) {
        OriginDecision::Rejected => Err(GatewayError::OriginNotAllowed(
            origin.unwrap_or_default().to_string(),
        )),
        OriginDecision::NoOrigin | OriginDecision::Allowed => Ok(next.run(req).await),
    }
}

/// CORS response headers and preflight answers for the allow-list
pub fn cors_layer(policy: &OriginPolicy) -> CorsLayer {
    let origins: Vec<HeaderValue> = policy
        .allowed_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::list(ALLOWED_METHODS))
        .allow_headers(AllowHeaders::list(ALLOWED_HEADERS))
        .allow_credentials(true)
}
