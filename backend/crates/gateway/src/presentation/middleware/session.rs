//! Session Stage
//!
//! Resolves the signed session cookie to a stored session (or a fresh one),
//! exposes it to inner stages, and persists it after the response is built.
//! Sessions are saved lazily: a request that writes nothing causes no store
//! write and no `Set-Cookie`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use platform::cookie::{CookieConfig, CookieSigner, extract_cookie, set_cookie_header};

use crate::domain::repository::SessionStore;
use crate::error::GatewayError;
use crate::presentation::context::{RequestCookies, Session, SessionOutcome};

/// Session stage state
pub struct SessionLayerState<S> {
    pub store: Arc<S>,
    pub cookie: Arc<CookieConfig>,
    pub signer: Arc<CookieSigner>,
    pub ttl_ms: i64,
}

impl<S> Clone for SessionLayerState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cookie: self.cookie.clone(),
            signer: self.signer.clone(),
            ttl_ms: self.ttl_ms,
        }
    }
}

pub async fn attach_session<S>(
    State(state): State<SessionLayerState<S>>,
    mut req: Request,
    next: Next,
) -> Result<Response, GatewayError>
where
    S: SessionStore + Send + Sync + 'static,
{
    let session_id = req
        .extensions()
        .get::<RequestCookies>()
        .ok_or(GatewayError::Misconfigured(
            "session stage requires cookie parsing",
        ))?
        .signed(&state.cookie.name)
        .map(str::to_owned);
    // Any value under the session name, verified or not, is worth clearing
    let carried_cookie = extract_cookie(req.headers(), &state.cookie.name).is_some();

    let now_ms = chrono::Utc::now().timestamp_millis();

    let stored = match session_id {
        Some(id) => state.store.load(&id).await?,
        None => None,
    };
    let session = match stored {
        Some(record) if !record.is_expired(now_ms) => Session::resumed(record),
        _ => Session::fresh(now_ms, state.ttl_ms),
    };

    req.extensions_mut().insert(session.clone());
    let mut response = next.run(req).await;

    match session.outcome().await {
        SessionOutcome::Untouched => {}
        SessionOutcome::Save { record, retired_id } => {
            if let Some(retired) = retired_id {
                state.store.destroy(&retired).await?;
            }
            state.store.save(&record).await?;

            let cookie = CookieConfig {
                max_age_secs: Some(record.remaining_secs(now_ms)),
                ..(*state.cookie).clone()
            };
            let value = cookie.build_set_cookie(&state.signer.sign(&record.id));
            if let Some(value) = set_cookie_header(&value) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        SessionOutcome::Destroy { id } => {
            let stored = id.is_some();
            if let Some(id) = id {
                state.store.destroy(&id).await?;
            }
            if stored || carried_cookie {
                if let Some(value) = set_cookie_header(&state.cookie.build_delete_cookie()) {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }
        }
    }

    Ok(response)
}
