//! Rate Limiting Infrastructure
//!
//! Fixed-window rate limiting abstractions and an in-process implementation.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
    /// Message returned to clients over the limit
    pub message: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            message: "Too many requests, please try again later.".to_string(),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64, message: impl Into<String>) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            message: message.into(),
        }
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window resets
    pub retry_after: Duration,
}

/// Rate limit store failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit backend unavailable: {0}")]
    Backend(String),
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Count one request against `key` and report whether it is allowed
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Drop windows that have already reset; returns how many were removed
    async fn purge_expired(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// In-process fixed-window counter keyed by client
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + config.window,
        });
        if window.reset_at <= now {
            *window = Window {
                count: 0,
                reset_at: now + config.window,
            };
        }

        window.count = window.count.saturating_add(1);
        let allowed = window.count <= config.max_requests;

        Ok(RateLimitResult {
            allowed,
            remaining: config.max_requests.saturating_sub(window.count),
            retry_after: window.reset_at.saturating_duration_since(now),
        })
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| window.reset_at > now);
        before - windows.len()
    }
}
