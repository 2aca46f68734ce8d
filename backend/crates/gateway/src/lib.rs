//! Gateway - HTTP entry point of the tournament platform
//!
//! Clean Architecture structure:
//! - `domain/` - Sessions, principals, origin policy, collaborator traits
//! - `application/` - Configuration and background maintenance
//! - `infra/` - Session store and identity strategy implementations
//! - `presentation/` - Pipeline stages, fault boundary, router table
//!
//! ## Request Flow
//! Every request passes the pipeline stages in a fixed order before it
//! reaches one of the five route modules (user, team, tournament, player,
//! wallet). Failures from any stage or router end at the fault boundary,
//! which logs them and renders `{ "success": false, "message": ... }`.
//!
//! ## Sessions
//! - Server-side records referenced by a signed `sid` cookie
//! - Saved lazily: no record and no cookie until something is written
//! - Fixed 24 hour lifetime from issuance

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{ConfigError, Environment, GatewayConfig};
pub use error::{GatewayError, GatewayResult};
pub use infra::identity::EmbeddedPrincipalStrategy;
pub use infra::memory::MemorySessionStore;
pub use infra::postgres::PgSessionStore;
pub use presentation::pipeline::{Collaborators, build_app};
pub use presentation::router::RouterTable;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod context {
    pub use crate::presentation::context::*;
}

pub mod models {
    pub use crate::domain::principal::*;
    pub use crate::domain::session::*;
}

pub mod store {
    pub use crate::domain::repository::{IdentityStrategy, SessionStore};
}

pub mod router {
    pub use crate::presentation::router::*;
}
