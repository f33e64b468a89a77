use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parlance_model::User;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::users::{USER_COLUMNS, UserRow};
use crate::database::ports::sessions::SessionsRepository;
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct PostgresSessionsRepository {
    pool: PgPool,
}

impl PostgresSessionsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SessionsRepository for PostgresSessionsRepository {
    async fn create_session(
        &self,
        token_hash: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             JOIN profiles p ON p.user_id = u.id \
             WHERE s.token_hash = $1 AND s.expires_at > $2"
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(User::from))
    }

    async fn delete_session(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool())
            .await?;
        let removed = result.rows_affected();
        if removed > 0 {
            debug!("Removed {} expired sessions", removed);
        }
        Ok(removed)
    }
}
