use async_trait::async_trait;
use parlance_model::{Language, LearnerLanguage};
use uuid::Uuid;

use crate::error::Result;
use crate::query::{LanguageFilters, LanguageSort, LearnerLanguageFilters, Sort};

#[derive(Debug, Clone)]
pub struct NewLanguage {
    pub code: String,
    pub name: String,
    pub greeting: String,
    pub flag: Option<String>,
    pub is_supported: bool,
}

#[async_trait]
pub trait LanguagesRepository: Send + Sync {
    async fn list_languages(
        &self,
        filters: &LanguageFilters,
        sort: Sort<LanguageSort>,
    ) -> Result<Vec<Language>>;
    async fn get_language_by_code(&self, code: &str)
    -> Result<Option<Language>>;
    async fn create_language(&self, language: &NewLanguage) -> Result<Language>;

    async fn list_learner_languages(
        &self,
        filters: &LearnerLanguageFilters,
        sort: Sort<LanguageSort>,
    ) -> Result<Vec<LearnerLanguage>>;
    async fn is_learning(&self, learner: Uuid, language_id: Uuid)
    -> Result<bool>;
    /// Conflict when the learner already studies the language.
    async fn add_learner_language(
        &self,
        learner: Uuid,
        language_id: Uuid,
    ) -> Result<LearnerLanguage>;
    /// Refreshes `last_opened`; `None` when not learning the language.
    async fn touch_learner_language(
        &self,
        learner: Uuid,
        language_id: Uuid,
    ) -> Result<Option<LearnerLanguage>>;
    /// Stops learning the language and drops the learner's saved vocabs and
    /// meanings in it. Returns `false` when not learning it.
    async fn remove_learner_language(
        &self,
        learner: Uuid,
        language_id: Uuid,
    ) -> Result<bool>;
}
