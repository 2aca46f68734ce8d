//! Embedded Principal Strategy
//!
//! Writes the whole principal into the session as JSON. Suitable when the
//! session store is trusted and principals carry no data that can go stale.

use kernel::error::app_error::{AppError, AppResult};

use crate::domain::principal::Principal;
use crate::domain::repository::IdentityStrategy;

#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedPrincipalStrategy;

impl IdentityStrategy for EmbeddedPrincipalStrategy {
    fn serialize(&self, principal: &Principal) -> AppResult<String> {
        serde_json::to_string(principal)
            .map_err(|e| AppError::internal("Failed to serialize principal").with_source(e))
    }

    async fn deserialize(&self, key: &str) -> AppResult<Option<Principal>> {
        match serde_json::from_str(key) {
            Ok(principal) => Ok(Some(principal)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable principal from session");
                Ok(None)
            }
        }
    }
}
