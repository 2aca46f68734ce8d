//! In-memory Session Store

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::repository::SessionStore;
use crate::domain::session::SessionRecord;
use crate::error::GatewayResult;

/// Process-local session store; sessions are lost on restart
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> GatewayResult<Option<SessionRecord>> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let sessions = self.sessions.read().await;

        Ok(sessions
            .get(id)
            .filter(|record| !record.is_expired(now_ms))
            .cloned())
    }

    async fn save(&self, record: &SessionRecord) -> GatewayResult<()> {
        self.sessions
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn destroy(&self, id: &str) -> GatewayResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn purge_expired(&self, now_ms: i64) -> GatewayResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now_ms));
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::SessionData;
    use serde_json::json;

    fn record(id: &str, issued_at_ms: i64, ttl_ms: i64) -> SessionRecord {
        let mut data = SessionData::new();
        data.insert("cart".into(), json!(["entry-fee"]));
        SessionRecord::new(id.to_string(), data, issued_at_ms, ttl_ms)
    }

    #[tokio::test]
    async fn test_save_load_destroy() {
        let store = MemorySessionStore::new();
        let now = chrono::Utc::now().timestamp_millis();

        store.save(&record("a", now, 60_000)).await.unwrap();
        let loaded = store.load("a").await.unwrap().unwrap();
        assert_eq!(loaded.data["cart"], json!(["entry-fee"]));

        store.destroy("a").await.unwrap();
        assert!(store.load("a").await.unwrap().is_none());
        store.destroy("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_sessions_are_invisible_and_purged() {
        let store = MemorySessionStore::new();
        let now = chrono::Utc::now().timestamp_millis();

        store.save(&record("old", now - 10_000, 5_000)).await.unwrap();
        store.save(&record("fresh", now, 60_000)).await.unwrap();

        assert!(store.load("old").await.unwrap().is_none());
        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }
}
