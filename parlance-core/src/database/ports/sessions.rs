use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parlance_model::User;
use uuid::Uuid;

use crate::error::Result;

/// Sessions are keyed by the digest of their token, never the token itself.
#[async_trait]
pub trait SessionsRepository: Send + Sync {
    async fn create_session(
        &self,
        token_hash: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;
    /// The owner of an unexpired session.
    async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;
    async fn delete_session(&self, token_hash: &str) -> Result<()>;
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64>;
}
