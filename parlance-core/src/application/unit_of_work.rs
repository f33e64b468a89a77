use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::infrastructure::postgres::{
    PostgresCollectionsRepository, PostgresLanguagesRepository,
    PostgresMeaningsRepository, PostgresSessionsRepository,
    PostgresTextsRepository, PostgresUsersRepository, PostgresVocabsRepository,
};
use crate::database::ports::{
    collections::CollectionsRepository, languages::LanguagesRepository,
    meanings::MeaningsRepository, sessions::SessionsRepository,
    texts::TextsRepository, users::UsersRepository, vocabs::VocabsRepository,
};
use crate::database::postgres::PostgresDatabase;

/// Aggregates all repository ports used by request handlers.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub users: Arc<dyn UsersRepository>,
    pub sessions: Arc<dyn SessionsRepository>,
    pub languages: Arc<dyn LanguagesRepository>,
    pub collections: Arc<dyn CollectionsRepository>,
    pub texts: Arc<dyn TextsRepository>,
    pub vocabs: Arc<dyn VocabsRepository>,
    pub meanings: Arc<dyn MeaningsRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("sessions", &type_name_of_val(self.sessions.as_ref()))
            .field("languages", &type_name_of_val(self.languages.as_ref()))
            .field(
                "collections",
                &type_name_of_val(self.collections.as_ref()),
            )
            .field("texts", &type_name_of_val(self.texts.as_ref()))
            .field("vocabs", &type_name_of_val(self.vocabs.as_ref()))
            .field("meanings", &type_name_of_val(self.meanings.as_ref()))
            .finish()
    }
}

#[derive(Default)]
pub struct AppUnitOfWorkBuilder {
    users: Option<Arc<dyn UsersRepository>>,
    sessions: Option<Arc<dyn SessionsRepository>>,
    languages: Option<Arc<dyn LanguagesRepository>>,
    collections: Option<Arc<dyn CollectionsRepository>>,
    texts: Option<Arc<dyn TextsRepository>>,
    vocabs: Option<Arc<dyn VocabsRepository>>,
    meanings: Option<Arc<dyn MeaningsRepository>>,
}

impl fmt::Debug for AppUnitOfWorkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWorkBuilder")
            .field("users", &self.users.is_some())
            .field("sessions", &self.sessions.is_some())
            .field("languages", &self.languages.is_some())
            .field("collections", &self.collections.is_some())
            .field("texts", &self.texts.is_some())
            .field("vocabs", &self.vocabs.is_some())
            .field("meanings", &self.meanings.is_some())
            .finish()
    }
}

impl AppUnitOfWorkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, repo: Arc<dyn UsersRepository>) -> Self {
        self.users = Some(repo);
        self
    }
    pub fn with_sessions(mut self, repo: Arc<dyn SessionsRepository>) -> Self {
        self.sessions = Some(repo);
        self
    }
    pub fn with_languages(
        mut self,
        repo: Arc<dyn LanguagesRepository>,
    ) -> Self {
        self.languages = Some(repo);
        self
    }
    pub fn with_collections(
        mut self,
        repo: Arc<dyn CollectionsRepository>,
    ) -> Self {
        self.collections = Some(repo);
        self
    }
    pub fn with_texts(mut self, repo: Arc<dyn TextsRepository>) -> Self {
        self.texts = Some(repo);
        self
    }
    pub fn with_vocabs(mut self, repo: Arc<dyn VocabsRepository>) -> Self {
        self.vocabs = Some(repo);
        self
    }
    pub fn with_meanings(mut self, repo: Arc<dyn MeaningsRepository>) -> Self {
        self.meanings = Some(repo);
        self
    }

    /// Returns a string error naming the first missing repository.
    pub fn build(self) -> Result<AppUnitOfWork, String> {
        Ok(AppUnitOfWork {
            users: self
                .users
                .ok_or_else(|| "missing UsersRepository".to_string())?,
            sessions: self
                .sessions
                .ok_or_else(|| "missing SessionsRepository".to_string())?,
            languages: self
                .languages
                .ok_or_else(|| "missing LanguagesRepository".to_string())?,
            collections: self
                .collections
                .ok_or_else(|| "missing CollectionsRepository".to_string())?,
            texts: self
                .texts
                .ok_or_else(|| "missing TextsRepository".to_string())?,
            vocabs: self
                .vocabs
                .ok_or_else(|| "missing VocabsRepository".to_string())?,
            meanings: self
                .meanings
                .ok_or_else(|| "missing MeaningsRepository".to_string())?,
        })
    }

    /// Populate the builder with Postgres-backed repository adapters.
    pub fn with_postgres(mut self, db: Arc<PostgresDatabase>) -> Self {
        let pool = db.pool().clone();

        self.users = Some(Arc::new(PostgresUsersRepository::new(pool.clone())));
        self.sessions =
            Some(Arc::new(PostgresSessionsRepository::new(pool.clone())));
        self.languages =
            Some(Arc::new(PostgresLanguagesRepository::new(pool.clone())));
        self.collections =
            Some(Arc::new(PostgresCollectionsRepository::new(pool.clone())));
        self.texts = Some(Arc::new(PostgresTextsRepository::new(pool.clone())));
        self.vocabs = Some(Arc::new(PostgresVocabsRepository::new(pool.clone())));
        self.meanings = Some(Arc::new(PostgresMeaningsRepository::new(pool)));

        self
    }
}

impl AppUnitOfWork {
    /// Compose all Postgres-backed repositories into a unit of work.
    pub fn from_postgres(db: Arc<PostgresDatabase>) -> Result<Self, String> {
        AppUnitOfWorkBuilder::new().with_postgres(db).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_names_the_missing_repository() {
        let err = AppUnitOfWorkBuilder::new().build().unwrap_err();
        assert_eq!(err, "missing UsersRepository");
    }
}
