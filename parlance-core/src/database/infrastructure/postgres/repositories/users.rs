use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parlance_model::{Profile, User};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::database::ports::users::{
    NewUser, ProfileChanges, UserCredentials, UsersRepository,
};
use crate::error::{CoreError, Result, map_unique_violation};

pub(crate) const USER_COLUMNS: &str = "u.id, u.username, u.email, \
     u.account_created_at, u.last_login_at, p.id AS profile_id, p.bio, \
     p.profile_picture, p.is_public";

const USER_CONFLICTS: &[(&str, &str)] = &[
    ("users_username_key", "Username already taken"),
    ("users_username_lower_idx", "Username already taken"),
    ("users_email_key", "Email already in use"),
];

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    account_created_at: DateTime<Utc>,
    last_login_at: DateTime<Utc>,
    profile_id: Uuid,
    bio: String,
    profile_picture: String,
    is_public: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            account_created_at: row.account_created_at,
            last_login_at: row.last_login_at,
            profile: Profile {
                id: row.profile_id,
                bio: row.bio,
                profile_picture: row.profile_picture,
                is_public: row.is_public,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// PostgreSQL-backed implementation of the `UsersRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut tx = self.pool().begin().await?;
        let user_id = Uuid::now_v7();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, USER_CONFLICTS, "Failed to create user")
        })?;

        sqlx::query("INSERT INTO profiles (id, user_id) VALUES ($1, $2)")
            .bind(Uuid::now_v7())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let created: UserRow = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             JOIN profiles p ON p.user_id = u.id WHERE u.id = $1"
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Created user: {} ({})", user.username, user_id);
        Ok(created.into())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             JOIN profiles p ON p.user_id = u.id WHERE u.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(User::from))
    }

    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             JOIN profiles p ON p.user_id = u.id \
             WHERE LOWER(u.username) = LOWER($1)"
        ))
        .bind(username)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(User::from))
    }

    async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>> {
        let row: Option<CredentialsRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, u.password_hash FROM users u \
             JOIN profiles p ON p.user_id = u.id \
             WHERE LOWER(u.username) = LOWER($1)"
        ))
        .bind(username)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|r| UserCredentials {
            user: r.user.into(),
            password_hash: r.password_hash,
        }))
    }

    async fn record_login(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<User> {
        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                bio = COALESCE($2, bio),
                profile_picture = COALESCE($3, profile_picture),
                is_public = COALESCE($4, is_public)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(changes.bio.as_deref())
        .bind(changes.profile_picture.as_deref())
        .bind(changes.is_public)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("User not found"));
        }

        self.get_user_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        // Profiles, sessions, association rows and authored collections and
        // texts cascade; authored meanings keep a null author.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("User not found"));
        }

        info!("Deleted user {}", user_id);
        Ok(())
    }
}
