//! Infrastructure Layer
//!
//! Session store and identity strategy implementations.

pub mod identity;
pub mod memory;
pub mod postgres;
