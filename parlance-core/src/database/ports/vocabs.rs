use async_trait::async_trait;
use parlance_model::{LearnerVocab, Page, Vocab, VocabLevel};
use uuid::Uuid;

use crate::error::Result;
use crate::query::{LearnerVocabFilters, ListRequest, VocabFilters, VocabSort};

/// A vocab and the id of its language.
#[derive(Debug, Clone)]
pub struct VocabRecord {
    pub vocab: Vocab,
    pub language_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewVocab {
    /// Already normalized.
    pub text: String,
    pub language_id: Uuid,
    pub is_phrase: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LearnerVocabChanges {
    pub level: Option<VocabLevel>,
    pub notes: Option<String>,
}

#[async_trait]
pub trait VocabsRepository: Send + Sync {
    async fn list_vocabs(
        &self,
        request: &ListRequest<VocabFilters, VocabSort>,
    ) -> Result<Page<Vocab>>;
    async fn get_vocab(&self, id: Uuid) -> Result<Option<VocabRecord>>;
    /// Returns the vocab and whether it was created by this call.
    async fn get_or_create_vocab(&self, vocab: &NewVocab)
    -> Result<(Vocab, bool)>;

    async fn list_learner_vocabs(
        &self,
        request: &ListRequest<LearnerVocabFilters, VocabSort>,
    ) -> Result<Page<LearnerVocab>>;
    async fn get_learner_vocab(
        &self,
        learner: Uuid,
        vocab_id: Uuid,
    ) -> Result<Option<LearnerVocab>>;
    /// Conflict when already saved.
    async fn save_learner_vocab(
        &self,
        learner: Uuid,
        vocab_id: Uuid,
        level: VocabLevel,
    ) -> Result<LearnerVocab>;
    async fn update_learner_vocab(
        &self,
        learner: Uuid,
        vocab_id: Uuid,
        changes: &LearnerVocabChanges,
    ) -> Result<Option<LearnerVocab>>;
    async fn delete_learner_vocab(&self, learner: Uuid, vocab_id: Uuid)
    -> Result<bool>;
    /// Saved vocabs occurring in a text: words by exact match, phrases as
    /// whole-word runs.
    async fn learner_vocabs_in_text(
        &self,
        learner: Uuid,
        text_id: Uuid,
    ) -> Result<Vec<LearnerVocab>>;
}
