#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use parlance_core::application::AppUnitOfWork;
use parlance_core::database::PostgresDatabase;
use parlance_core::database::ports::collections::NewCollection;
use parlance_core::database::ports::languages::NewLanguage;
use parlance_core::database::ports::texts::NewText;
use parlance_core::database::ports::users::NewUser;
use parlance_model::{Collection, Language, Text, User};
use sqlx::PgPool;
use uuid::Uuid;

/// Repositories over a fresh test database plus seeding shortcuts.
pub struct World {
    pub pool: PgPool,
    pub uow: AppUnitOfWork,
}

impl World {
    pub fn new(pool: PgPool) -> Result<Self> {
        let db = Arc::new(PostgresDatabase::from_pool(pool.clone()));
        let uow =
            AppUnitOfWork::from_postgres(db).map_err(anyhow::Error::msg)?;
        Ok(Self { pool, uow })
    }

    pub async fn user(&self, username: &str) -> Result<User> {
        self.uow
            .users
            .create_user(&NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "$argon2id$unused".to_string(),
            })
            .await
            .context("create user")
    }

    pub async fn language(&self, code: &str, name: &str) -> Result<Language> {
        self.uow
            .languages
            .create_language(&NewLanguage {
                code: code.to_string(),
                name: name.to_string(),
                greeting: String::new(),
                flag: None,
                is_supported: true,
            })
            .await
            .context("create language")
    }

    pub async fn collection(
        &self,
        author: &User,
        language: &Language,
        title: &str,
        is_public: bool,
    ) -> Result<Collection> {
        self.uow
            .collections
            .create_collection(&NewCollection {
                title: title.to_string(),
                description: String::new(),
                image: String::new(),
                language_id: language.id,
                added_by: author.profile.id,
                is_public,
            })
            .await
            .context("create collection")
    }

    pub async fn text(
        &self,
        author: &User,
        language: &Language,
        title: &str,
        content: &str,
        collection_id: Option<Uuid>,
        is_public: bool,
    ) -> Result<Text> {
        self.uow
            .texts
            .create_text(
                &NewText {
                    title: title.to_string(),
                    content: content.to_string(),
                    audio: String::new(),
                    image: String::new(),
                    language_id: language.id,
                    collection_id,
                    level: None,
                    is_public,
                    added_by: author.profile.id,
                },
                author.profile.id,
            )
            .await
            .context("create text")
    }
}
