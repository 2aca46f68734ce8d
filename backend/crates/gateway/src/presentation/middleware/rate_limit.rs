//! Rate Limiting Stage
//!
//! Fixed-window limit per client address. A client over the limit is
//! answered directly with the configured message; the limiter's response is
//! not a failure and is shown verbatim in every environment.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::ErrorEnvelope;
use platform::client::client_key;
use platform::rate_limit::{RateLimitConfig, RateLimitResult, RateLimitStore};

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Rate limiting stage state
pub struct RateLimitLayerState<R> {
    pub store: Arc<R>,
    pub config: Arc<RateLimitConfig>,
    /// Keeps counters of different limiters apart in a shared store
    pub scope: &'static str,
    /// Key on forwarded headers instead of the socket address
    pub trust_proxy: bool,
}

impl<R> RateLimitLayerState<R> {
    pub fn new(store: Arc<R>, config: RateLimitConfig, scope: &'static str) -> Self {
        Self {
            store,
            config: Arc::new(config),
            scope,
            trust_proxy: false,
        }
    }

    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }
}

impl<R> Clone for RateLimitLayerState<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            scope: self.scope,
            trust_proxy: self.trust_proxy,
        }
    }
}

fn reset_secs(retry_after: Duration) -> u64 {
    retry_after.as_secs().max(1)
}

fn insert_quota_headers(headers: &mut HeaderMap, config: &RateLimitConfig, result: &RateLimitResult) {
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(config.max_requests));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(result.remaining));
    headers.insert(
        RATELIMIT_RESET,
        HeaderValue::from(reset_secs(result.retry_after)),
    );
}

/// 429 answer for a client over the limit
pub fn limit_exceeded(config: &RateLimitConfig, result: &RateLimitResult) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorEnvelope::detailed(config.message.clone())),
    )
        .into_response();

    let headers = response.headers_mut();
    insert_quota_headers(headers, config, result);
    headers.insert(
        header::RETRY_AFTER,
        HeaderValue::from(reset_secs(result.retry_after)),
    );
    response
}

pub async fn limit_rate<R>(
    State(state): State<RateLimitLayerState<R>>,
    req: Request,
    next: Next,
) -> Response
where
    R: RateLimitStore + Send + Sync + 'static,
{
    let direct_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let client = client_key(req.headers(), direct_ip, state.trust_proxy);
    let key = format!("{}:{}", state.scope, client);

    let result = match state.store.check_and_increment(&key, &state.config).await {
        Ok(result) => result,
        Err(e) => {
            // Fail open: an unavailable limiter must not take the API down
            tracing::warn!(error = %e, scope = state.scope, "Rate limit check failed");
            return next.run(req).await;
        }
    };

    if !result.allowed {
        tracing::debug!(
            key = %key,
            retry_after_secs = result.retry_after.as_secs(),
            "Rate limit hit"
        );
        return limit_exceeded(&state.config, &result);
    }

    let mut response = next.run(req).await;
    insert_quota_headers(response.headers_mut(), &state.config, &result);
    response
}
