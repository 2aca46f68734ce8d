//! Session Record Entity

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Values stored in a session
pub type SessionData = Map<String, Value>;

/// Server-side session state, correlated with a signed client cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub data: SessionData,
    pub issued_at_ms: i64,
    /// Fixed at issuance: `issued_at_ms + ttl`
    pub expires_at_ms: i64,
}

impl SessionRecord {
    pub fn new(id: String, data: SessionData, issued_at_ms: i64, ttl_ms: i64) -> Self {
        Self {
            id,
            data,
            issued_at_ms,
            expires_at_ms: issued_at_ms.saturating_add(ttl_ms),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms <= now_ms
    }

    /// Whole seconds left before expiry, never negative
    pub fn remaining_secs(&self, now_ms: i64) -> i64 {
        ((self.expires_at_ms - now_ms) / 1000).max(0)
    }
}

/// Fresh session identifier (24 random bytes, base64url)
pub fn new_session_id() -> String {
    platform::crypto::random_token(24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_fixed_at_issuance() {
        let record = SessionRecord::new("id".into(), SessionData::new(), 1_000, 86_400_000);
        assert_eq!(record.expires_at_ms, 86_401_000);
        assert!(!record.is_expired(86_400_999));
        assert!(record.is_expired(86_401_000));
    }

    #[test]
    fn test_remaining_secs() {
        let record = SessionRecord::new("id".into(), SessionData::new(), 0, 10_000);
        assert_eq!(record.remaining_secs(0), 10);
        assert_eq!(record.remaining_secs(9_500), 0);
        assert_eq!(record.remaining_secs(20_000), 0);
    }

    #[test]
    fn test_new_session_ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
    }
}
