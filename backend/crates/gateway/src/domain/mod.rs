//! Domain Layer
//!
//! Pipeline vocabulary and the collaborator interfaces.

pub mod origin;
pub mod principal;
pub mod repository;
pub mod sanitize;
pub mod session;
