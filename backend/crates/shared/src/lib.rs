//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" shared by every crate of the
//! gateway workspace:
//! - The unified error type and result alias
//! - The client-facing error envelope (`{ success, message }`)
//! - Conversions from common library errors
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all route modules.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod envelope;
    pub mod kind;
}

pub use error::app_error::{AppError, AppResult};
pub use error::envelope::{ErrorEnvelope, FailureReport, GENERIC_FAILURE_MESSAGE};
pub use error::kind::ErrorKind;
