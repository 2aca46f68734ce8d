//! Expired State Cleanup
//!
//! Sessions and rate-limit windows are only ever read while unexpired, so
//! cleanup is about bounding storage, not correctness.

use std::sync::Arc;
use std::time::Duration;

use platform::rate_limit::RateLimitStore;
use tokio::task::JoinHandle;

use crate::domain::repository::SessionStore;

/// How often the background task runs
pub const PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Outcome of one cleanup run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub sessions_deleted: u64,
    pub rate_limit_windows_deleted: usize,
}

/// Remove expired sessions and rate-limit windows once
///
/// Session store failures are logged and reported as zero deletions.
pub async fn purge_expired<S, R>(sessions: &S, rate_limits: &R) -> PurgeReport
where
    S: SessionStore,
    R: RateLimitStore,
{
    let now_ms = chrono::Utc::now().timestamp_millis();

    let sessions_deleted = match sessions.purge_expired(now_ms).await {
        Ok(deleted) => deleted,
        Err(e) => {
            tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
            0
        }
    };
    let rate_limit_windows_deleted = rate_limits.purge_expired().await;

    PurgeReport {
        sessions_deleted,
        rate_limit_windows_deleted,
    }
}

/// Run [`purge_expired`] every `every` until the runtime shuts down
pub fn spawn_purge_task<S, R>(sessions: Arc<S>, rate_limits: Arc<R>, every: Duration) -> JoinHandle<()>
where
    S: SessionStore + Send + Sync + 'static,
    R: RateLimitStore + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately; startup already purged
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = purge_expired(sessions.as_ref(), rate_limits.as_ref()).await;
            tracing::info!(
                sessions_deleted = report.sessions_deleted,
                rate_limit_windows_deleted = report.rate_limit_windows_deleted,
                "Expired state cleanup completed"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::{SessionData, SessionRecord};
    use crate::infra::memory::MemorySessionStore;
    use platform::rate_limit::MemoryRateLimitStore;

    #[tokio::test]
    async fn test_purge_removes_only_expired_sessions() {
        let sessions = MemorySessionStore::new();
        let now_ms = chrono::Utc::now().timestamp_millis();

        let expired = SessionRecord::new("old".into(), SessionData::new(), now_ms - 10_000, 1_000);
        let live = SessionRecord::new("new".into(), SessionData::new(), now_ms, 60_000);
        sessions.save(&expired).await.unwrap();
        sessions.save(&live).await.unwrap();

        let report = purge_expired(&sessions, &MemoryRateLimitStore::new()).await;

        assert_eq!(report.sessions_deleted, 1);
        assert_eq!(sessions.len().await, 1);
        assert!(sessions.load("new").await.unwrap().is_some());
    }
}
