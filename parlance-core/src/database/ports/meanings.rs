use async_trait::async_trait;
use parlance_model::Meaning;
use uuid::Uuid;

use crate::error::Result;
use crate::query::{MeaningFilters, MeaningSort, Sort};

#[derive(Debug, Clone)]
pub struct NewMeaning {
    pub text: String,
    pub vocab_id: Uuid,
    pub language_id: Uuid,
    pub added_by: Uuid,
}

#[async_trait]
pub trait MeaningsRepository: Send + Sync {
    async fn list_meanings(
        &self,
        filters: &MeaningFilters,
        sort: Sort<MeaningSort>,
    ) -> Result<Vec<Meaning>>;
    async fn get_meaning(&self, id: Uuid) -> Result<Option<Meaning>>;
    /// Returns the meaning and whether it was created by this call.
    async fn get_or_create_meaning(
        &self,
        meaning: &NewMeaning,
    ) -> Result<(Meaning, bool)>;
    /// Saves the meaning, and its vocab at level new when not yet saved.
    /// Conflict when the meaning is already saved.
    async fn save_learner_meaning(
        &self,
        learner: Uuid,
        meaning_id: Uuid,
    ) -> Result<()>;
    async fn delete_learner_meaning(
        &self,
        learner: Uuid,
        meaning_id: Uuid,
    ) -> Result<bool>;
}
