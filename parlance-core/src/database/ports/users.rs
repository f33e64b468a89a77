use async_trait::async_trait;
use parlance_model::User;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Stored credentials for one account.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Fields left `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub is_public: Option<bool>,
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Creates the account and its profile. Duplicate usernames or emails
    /// are conflicts.
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// Case-insensitive.
    async fn get_user_by_username(&self, username: &str)
    -> Result<Option<User>>;
    async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>>;
    async fn record_login(&self, user_id: Uuid) -> Result<()>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<User>;
    /// Removes the account with everything it owns.
    async fn delete_user(&self, user_id: Uuid) -> Result<()>;
}
