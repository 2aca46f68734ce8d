//! CORS Origin Policy

use axum::http::{Method, header::HeaderName};

/// Methods allowed on cross-origin requests
pub const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Request headers allowed on cross-origin requests
pub const ALLOWED_HEADERS: [HeaderName; 2] = [
    axum::http::header::CONTENT_TYPE,
    axum::http::header::AUTHORIZATION,
];

/// Outcome of checking a request's `Origin` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    /// No `Origin` header: a non-browser client
    NoOrigin,
    Allowed,
    Rejected,
}

impl OriginDecision {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, OriginDecision::Rejected)
    }
}

/// Immutable allow-list built once at startup
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed
    }

    /// Exact comparison against the allow-list
    pub fn check(&self, origin: Option<&str>) -> OriginDecision {
        match origin {
            None => OriginDecision::NoOrigin,
            Some(origin) if self.allowed.iter().any(|allowed| allowed == origin) => {
                OriginDecision::Allowed
            }
            Some(_) => OriginDecision::Rejected,
        }
    }
}
