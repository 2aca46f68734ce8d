//! Presentation Layer
//!
//! Request context, pipeline stages, fault boundary and router table.

pub mod context;
pub mod fault;
pub mod middleware;
pub mod pipeline;
pub mod router;
