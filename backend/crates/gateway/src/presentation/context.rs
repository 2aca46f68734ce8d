//! Request Context
//!
//! State the pipeline attaches to each request through extensions, and the
//! extractors route handlers use to read it.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use kernel::error::app_error::{AppError, AppResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::principal::Principal;
use crate::domain::repository::IdentityStrategy;
use crate::domain::session::{SessionData, SessionRecord, new_session_id};
use crate::error::GatewayResult;

/// Session key under which the serialized principal is stored
pub const PRINCIPAL_SESSION_KEY: &str = "principal";

// ============================================================================
// Cookies
// ============================================================================

/// Cookies parsed from the request
///
/// Values in the signed layout appear only in `signed`, and only when their
/// signature verifies.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    plain: HashMap<String, String>,
    signed: HashMap<String, String>,
}

impl RequestCookies {
    pub fn new(plain: HashMap<String, String>, signed: HashMap<String, String>) -> Self {
        Self { plain, signed }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.plain.get(name).map(String::as_str)
    }

    pub fn signed(&self, name: &str) -> Option<&str> {
        self.signed.get(name).map(String::as_str)
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug)]
struct SessionState {
    id: String,
    /// Whether a record exists in the store under `id`
    persisted: bool,
    data: SessionData,
    issued_at_ms: i64,
    ttl_ms: i64,
    modified: bool,
    destroyed: bool,
    /// Stored ID abandoned by `regenerate`, deleted on commit
    retired_id: Option<String>,
}

/// What the session stage must do once the response is produced
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Nothing written; no store access and no cookie
    Untouched,
    /// Store the record and issue the cookie
    Save {
        record: SessionRecord,
        retired_id: Option<String>,
    },
    /// Remove the stored record and expire the cookie
    Destroy { id: Option<String> },
}

/// Handle to the request's session
///
/// Cloned handles share state. Writes are only persisted when the response
/// leaves the session stage.
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Session that has never been stored
    pub fn fresh(now_ms: i64, ttl_ms: i64) -> Self {
        Self::from_state(SessionState {
            id: new_session_id(),
            persisted: false,
            data: SessionData::new(),
            issued_at_ms: now_ms,
            ttl_ms,
            modified: false,
            destroyed: false,
            retired_id: None,
        })
    }

    /// Session resumed from the store
    pub fn resumed(record: SessionRecord) -> Self {
        Self::from_state(SessionState {
            ttl_ms: record.expires_at_ms - record.issued_at_ms,
            id: record.id,
            persisted: true,
            data: record.data,
            issued_at_ms: record.issued_at_ms,
            modified: false,
            destroyed: false,
            retired_id: None,
        })
    }

    fn from_state(state: SessionState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn id(&self) -> String {
        self.state.lock().await.id.clone()
    }

    /// Whether this session was loaded from the store
    pub async fn is_persisted(&self) -> bool {
        self.state.lock().await.persisted
    }

    pub async fn get_value(&self, key: &str) -> Option<Value> {
        self.state.lock().await.data.get(key).cloned()
    }

    /// Typed read; values that do not deserialize as `T` read as absent
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key).await?;
        serde_json::from_value(value).ok()
    }

    pub async fn insert<T: Serialize>(&self, key: &str, value: T) -> GatewayResult<()> {
        let value = serde_json::to_value(value)?;
        let mut state = self.state.lock().await;
        state.data.insert(key.to_string(), value);
        state.modified = true;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        let mut state = self.state.lock().await;
        let removed = state.data.remove(key);
        if removed.is_some() {
            state.modified = true;
        }
        removed
    }

    /// Rotate the session ID and restart its lifetime, keeping the data
    pub async fn regenerate(&self, now_ms: i64) {
        let mut state = self.state.lock().await;
        if state.persisted {
            let old = std::mem::replace(&mut state.id, new_session_id());
            state.retired_id = Some(old);
        } else {
            state.id = new_session_id();
        }
        state.persisted = false;
        state.issued_at_ms = now_ms;
        state.modified = true;
    }

    /// Invalidate the session; later writes in this request are discarded
    pub async fn destroy(&self) {
        let mut state = self.state.lock().await;
        state.destroyed = true;
        state.data.clear();
    }

    /// Decide what to persist; called once by the session stage
    pub async fn outcome(&self) -> SessionOutcome {
        let state = self.state.lock().await;

        if state.destroyed {
            let id = state
                .persisted
                .then(|| state.id.clone())
                .or_else(|| state.retired_id.clone());
            return SessionOutcome::Destroy { id };
        }

        if !state.modified {
            return SessionOutcome::Untouched;
        }

        if state.data.is_empty() {
            // Nothing left worth keeping: lazy save means no record at all
            let id = state
                .persisted
                .then(|| state.id.clone())
                .or_else(|| state.retired_id.clone());
            return match id {
                Some(id) => SessionOutcome::Destroy { id: Some(id) },
                None => SessionOutcome::Untouched,
            };
        }

        SessionOutcome::Save {
            record: SessionRecord {
                id: state.id.clone(),
                data: state.data.clone(),
                issued_at_ms: state.issued_at_ms,
                expires_at_ms: state.issued_at_ms.saturating_add(state.ttl_ms),
            },
            retired_id: state.retired_id.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::internal("Session stage is not installed"))
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Principal attached by the identity stage, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity(pub Option<Principal>);

impl Identity {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().unwrap_or_default())
    }
}

/// Extractor that requires an authenticated principal
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .and_then(|identity| identity.0.clone())
            .map(CurrentPrincipal)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// Extractor that requires an authenticated admin
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) = CurrentPrincipal::from_request_parts(parts, state).await?;
        if principal.is_admin() {
            Ok(AdminPrincipal(principal))
        } else {
            Err(AppError::forbidden("Admin access required"))
        }
    }
}

/// Establish `principal` in the session after the route module verified it
///
/// The session ID is rotated so a pre-login ID can never carry a login.
pub async fn log_in<I>(session: &Session, strategy: &I, principal: &Principal) -> AppResult<()>
where
    I: IdentityStrategy,
{
    let key = strategy.serialize(principal)?;
    session
        .regenerate(chrono::Utc::now().timestamp_millis())
        .await;
    session
        .insert(PRINCIPAL_SESSION_KEY, key)
        .await
        .map_err(AppError::from)
}

/// End the login and invalidate the session
pub async fn log_out(session: &Session) {
    session.remove(PRINCIPAL_SESSION_KEY).await;
    session.destroy().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DAY_MS: i64 = 86_400_000;

    fn stored(id: &str) -> SessionRecord {
        let mut data = SessionData::new();
        data.insert("theme".into(), json!("dark"));
        SessionRecord::new(id.to_string(), data, 1_000, DAY_MS)
    }

    #[tokio::test]
    async fn test_fresh_session_without_writes_is_untouched() {
        let session = Session::fresh(0, DAY_MS);
        assert_eq!(session.get_value("anything").await, None);
        assert_eq!(session.outcome().await, SessionOutcome::Untouched);
    }

    #[tokio::test]
    async fn test_write_produces_save_with_fixed_expiry() {
        let session = Session::fresh(5_000, DAY_MS);
        session.insert("cart", vec!["entry"]).await.unwrap();

        match session.outcome().await {
            SessionOutcome::Save { record, retired_id } => {
                assert_eq!(record.issued_at_ms, 5_000);
                assert_eq!(record.expires_at_ms, 5_000 + DAY_MS);
                assert_eq!(record.data["cart"], json!(["entry"]));
                assert!(retired_id.is_none());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resumed_session_keeps_issuance() {
        let session = Session::resumed(stored("abc"));
        assert!(session.is_persisted().await);
        assert_eq!(session.get::<String>("theme").await.as_deref(), Some("dark"));

        session.insert("theme", "light").await.unwrap();
        match session.outcome().await {
            SessionOutcome::Save { record, .. } => {
                assert_eq!(record.id, "abc");
                assert_eq!(record.issued_at_ms, 1_000);
                assert_eq!(record.expires_at_ms, 1_000 + DAY_MS);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_regenerate_retires_stored_id() {
        let session = Session::resumed(stored("old-id"));
        session.regenerate(9_000).await;

        match session.outcome().await {
            SessionOutcome::Save { record, retired_id } => {
                assert_ne!(record.id, "old-id");
                assert_eq!(record.issued_at_ms, 9_000);
                assert_eq!(retired_id.as_deref(), Some("old-id"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_emptying_a_stored_session_destroys_it() {
        let session = Session::resumed(stored("abc"));
        session.remove("theme").await;
        assert_eq!(
            session.outcome().await,
            SessionOutcome::Destroy {
                id: Some("abc".into())
            }
        );
    }

    #[tokio::test]
    async fn test_admin_extractor() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let err = AdminPrincipal::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status_code(), 401);

        parts.extensions.insert(Identity(Some(Principal::user("u-1"))));
        let err = AdminPrincipal::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        parts.extensions.insert(Identity(Some(Principal::admin("a-1"))));
        let AdminPrincipal(admin) = AdminPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(admin.id, "a-1");
    }

    #[tokio::test]
    async fn test_destroy_discards_writes() {
        let session = Session::fresh(0, DAY_MS);
        session.destroy().await;
        session.insert("late", 1).await.unwrap();
        assert_eq!(session.outcome().await, SessionOutcome::Destroy { id: None });
    }
}
