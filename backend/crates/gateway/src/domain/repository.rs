//! Collaborator Traits
//!
//! Interfaces the pipeline depends on. Implementations live in `infra/` or
//! in the crates that own the identity model.

use kernel::error::app_error::AppResult;

use crate::domain::principal::Principal;
use crate::domain::session::SessionRecord;
use crate::error::GatewayResult;

/// Session store shared by every in-flight request
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Load an unexpired session by ID
    async fn load(&self, id: &str) -> GatewayResult<Option<SessionRecord>>;

    /// Insert or replace a session
    async fn save(&self, record: &SessionRecord) -> GatewayResult<()>;

    /// Delete a session; deleting an unknown ID is not an error
    async fn destroy(&self, id: &str) -> GatewayResult<()>;

    /// Remove expired sessions; returns how many were removed
    async fn purge_expired(&self, now_ms: i64) -> GatewayResult<u64>;
}

/// Identity strategy registry
///
/// Decides how a principal is written into a session and how it is turned
/// back into a principal on later requests. Credential validation is the
/// owning route module's concern.
#[trait_variant::make(IdentityStrategy: Send)]
pub trait LocalIdentityStrategy {
    /// Session key stored for `principal` on login
    fn serialize(&self, principal: &Principal) -> AppResult<String>;

    /// Resolve a stored key; `Ok(None)` means the principal no longer exists
    async fn deserialize(&self, key: &str) -> AppResult<Option<Principal>>;
}
