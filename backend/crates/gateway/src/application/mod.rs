//! Application Layer
//!
//! Startup configuration and background maintenance.

pub mod config;
pub mod maintenance;

// Re-exports
pub use config::{ConfigError, Environment, GatewayConfig, SecretKey, SessionConfig};
pub use maintenance::{PURGE_INTERVAL, purge_expired, spawn_purge_task};
