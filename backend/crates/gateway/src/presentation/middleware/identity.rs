//! Identity Stage
//!
//! Turns the principal key stored in the session back into a principal.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use kernel::error::app_error::AppError;

use crate::domain::repository::IdentityStrategy;
use crate::error::GatewayError;
use crate::presentation::context::{Identity, PRINCIPAL_SESSION_KEY, Session};

pub async fn attach_identity<I>(
    State(strategy): State<Arc<I>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError>
where
    I: IdentityStrategy + Send + Sync + 'static,
{
    let session = req
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or(GatewayError::Misconfigured(
            "identity stage requires the session stage",
        ))?;

    let principal = match session.get::<String>(PRINCIPAL_SESSION_KEY).await {
        Some(key) => {
            let principal = strategy.deserialize(&key).await?;
            if principal.is_none() {
                tracing::info!("Dropping unknown principal from session");
                session.remove(PRINCIPAL_SESSION_KEY).await;
            }
            principal
        }
        None => None,
    };

    req.extensions_mut().insert(Identity(principal));
    Ok(next.run(req).await)
}
