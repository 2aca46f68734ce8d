//! Pipeline Stages
//!
//! One module per stage. Stages are plain `axum::middleware` functions;
//! their order is decided by `presentation::pipeline`.

pub mod body;
pub mod cookies;
pub mod identity;
pub mod origin;
pub mod rate_limit;
pub mod security_headers;
pub mod session;
pub mod timeout;

pub use body::{BodyParsing, parse_body};
pub use cookies::parse_request_cookies;
pub use identity::attach_identity;
pub use origin::{cors_layer, enforce_origin};
pub use rate_limit::{RateLimitLayerState, limit_rate};
pub use security_headers::with_security_headers;
pub use session::{SessionLayerState, attach_session};
pub use timeout::enforce_timeout;
