//! PostgreSQL Session Store

use sqlx::PgPool;

use crate::domain::repository::SessionStore;
use crate::domain::session::{SessionData, SessionRecord};
use crate::error::GatewayResult;

/// PostgreSQL-backed session store
///
/// Table layout (see `database/migrations`):
/// `sessions(sid TEXT PRIMARY KEY, data TEXT, issued_at_ms BIGINT, expires_at_ms BIGINT)`
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionStore for PgSessionStore {
    async fn load(&self, id: &str) -> GatewayResult<Option<SessionRecord>> {
        let now_ms = chrono::Utc::now().timestamp_millis();

        let row: Option<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT data, issued_at_ms, expires_at_ms
            FROM sessions
            WHERE sid = $1 AND expires_at_ms > $2
            "#,
        )
        .bind(id)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        let Some((data, issued_at_ms, expires_at_ms)) = row else {
            return Ok(None);
        };

        let data: SessionData = serde_json::from_str(&data)?;

        Ok(Some(SessionRecord {
            id: id.to_string(),
            data,
            issued_at_ms,
            expires_at_ms,
        }))
    }

    async fn save(&self, record: &SessionRecord) -> GatewayResult<()> {
        let data = serde_json::to_string(&record.data)?;

        sqlx::query(
            r#"
            INSERT INTO sessions (sid, data, issued_at_ms, expires_at_ms)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (sid) DO UPDATE
            SET data = EXCLUDED.data,
                issued_at_ms = EXCLUDED.issued_at_ms,
                expires_at_ms = EXCLUDED.expires_at_ms
            "#,
        )
        .bind(&record.id)
        .bind(data)
        .bind(record.issued_at_ms)
        .bind(record.expires_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn destroy(&self, id: &str) -> GatewayResult<()> {
        sqlx::query("DELETE FROM sessions WHERE sid = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now_ms: i64) -> GatewayResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE expires_at_ms <= $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}
