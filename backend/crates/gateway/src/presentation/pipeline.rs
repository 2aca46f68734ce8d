//! Request Pipeline
//!
//! Assembles the stages around the router table. Request order, outermost
//! first:
//!
//! 1. compression (optional)
//! 2. security headers (optional)
//! 3. fault boundary
//! 4. panic catcher
//! 5. HTTP tracing
//! 6. request timeout
//! 7. global rate limit (optional)
//! 8. body parsing and sanitization
//! 9. cookie parsing
//! 10. session
//! 11. identity
//! 12. origin enforcement
//! 13. CORS
//!
//! A failing stage returns without calling the stages inside it.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use platform::cookie::CookieSigner;
use platform::rate_limit::RateLimitStore;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::application::config::GatewayConfig;
use crate::domain::origin::OriginPolicy;
use crate::domain::repository::{IdentityStrategy, SessionStore};
use crate::presentation::fault::{FaultBoundary, fault_boundary, panic_response};
use crate::presentation::middleware::{
    BodyParsing, RateLimitLayerState, SessionLayerState, attach_identity, attach_session,
    cors_layer, enforce_origin, enforce_timeout, limit_rate, parse_body, parse_request_cookies,
    with_security_headers,
};
use crate::presentation::router::RouterTable;

/// Shared services the pipeline stages depend on
pub struct Collaborators<S, I, R> {
    pub sessions: Arc<S>,
    pub identity: Arc<I>,
    pub rate_limits: Arc<R>,
}

/// Build the complete application: every stage plus the mounted routers
pub fn build_app<S, I, R>(
    config: &GatewayConfig,
    routes: RouterTable,
    collaborators: Collaborators<S, I, R>,
) -> Router
where
    S: SessionStore + Send + Sync + 'static,
    I: IdentityStrategy + Send + Sync + 'static,
    R: RateLimitStore + Send + Sync + 'static,
{
    let Collaborators {
        sessions,
        identity,
        rate_limits,
    } = collaborators;

    let routes = match &config.auth_rate_limit {
        Some(limit) => {
            let state = RateLimitLayerState::new(rate_limits.clone(), limit.clone(), "auth")
                .trust_proxy(config.trust_proxy);
            routes.map_user(|user| user.layer(from_fn_with_state(state, limit_rate::<R>)))
        }
        None => routes,
    };

    let policy = OriginPolicy::new(config.allowed_origins.iter().cloned());
    let signer = Arc::new(CookieSigner::new(config.secret_key.as_bytes()));

    let session_state = SessionLayerState {
        store: sessions,
        cookie: Arc::new(config.session_cookie()),
        signer: signer.clone(),
        ttl_ms: config.session.ttl_ms(),
    };
    let body_parsing = BodyParsing {
        limit: config.body_limit_bytes,
        sanitize: config.sanitize_input,
    };

    // Layers wrap everything added before them: innermost first
    let mut app = routes
        .into_router()
        .layer(cors_layer(&policy))
        .layer(from_fn_with_state(Arc::new(policy), enforce_origin))
        .layer(from_fn_with_state(identity, attach_identity::<I>))
        .layer(from_fn_with_state(session_state, attach_session::<S>))
        .layer(from_fn_with_state(signer, parse_request_cookies))
        .layer(from_fn_with_state(body_parsing, parse_body));

    if let Some(limit) = &config.rate_limit {
        let state = RateLimitLayerState::new(rate_limits, limit.clone(), "global")
            .trust_proxy(config.trust_proxy);
        app = app.layer(from_fn_with_state(state, limit_rate::<R>));
    }

    app = app
        .layer(from_fn_with_state(config.request_timeout, enforce_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(
            FaultBoundary {
                expose_detail: config.expose_error_detail(),
            },
            fault_boundary,
        ));

    if config.security_headers {
        app = with_security_headers(app, config.environment.is_production());
    }
    if config.compression {
        app = app.layer(CompressionLayer::new());
    }

    app
}
