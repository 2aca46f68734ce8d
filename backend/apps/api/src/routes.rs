//! Routes served by the API binary itself
//!
//! The user module's session surface and the readiness probe. The other
//! route modules are mounted from their own crates.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use gateway::context::{Identity, Session, log_out};
use gateway::models::Principal;
use kernel::AppResult;
use serde::Serialize;
use serde_json::{Value, json};
use sqlx::PgPool;

/// Current login state of the caller
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub success: bool,
    pub authenticated: bool,
    pub user: Option<Principal>,
}

/// `/api/v1/user` session endpoints
pub fn user_router() -> Router {
    Router::new()
        .route("/session", get(current_session))
        .route("/logout", post(logout))
}

/// `GET /health`: database readiness
pub fn health_router(pool: PgPool) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(pool)
}

async fn current_session(identity: Identity) -> Json<SessionView> {
    let Identity(user) = identity;
    Json(SessionView {
        success: true,
        authenticated: user.is_some(),
        user,
    })
}

async fn logout(session: Session) -> Json<Value> {
    log_out(&session).await;
    Json(json!({ "success": true, "message": "Logged out" }))
}

async fn health(State(pool): State<PgPool>) -> AppResult<Json<Value>> {
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(Json(json!({ "success": true, "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn call(router: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_session_view_for_anonymous_caller() {
        let req = Request::get("/session").body(Body::empty()).unwrap();
        let (status, body) = call(user_router(), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "success": true, "authenticated": false, "user": null })
        );
    }

    #[tokio::test]
    async fn test_session_view_for_principal() {
        let mut req = Request::get("/session").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(Identity(Some(Principal::admin("a-1"))));

        let (_, body) = call(user_router(), req).await;

        assert_eq!(body["authenticated"], json!(true));
        assert_eq!(body["user"], json!({ "id": "a-1", "role": "admin" }));
    }

    #[tokio::test]
    async fn test_logout_destroys_session() {
        let session = Session::fresh(0, 1_000);
        let mut req = Request::post("/logout").body(Body::empty()).unwrap();
        req.extensions_mut().insert(session.clone());

        let (status, _) = call(user_router(), req).await;

        assert_eq!(status, StatusCode::OK);
        assert!(matches!(
            session.outcome().await,
            gateway::context::SessionOutcome::Destroy { .. }
        ));
    }
}
