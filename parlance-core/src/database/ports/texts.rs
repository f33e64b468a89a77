use async_trait::async_trait;
use parlance_model::{LanguageLevel, Page, Text, TextHistoryEntry};
use uuid::Uuid;

use crate::error::Result;
use crate::privacy::TextPrivacy;
use crate::query::{
    HistorySort, ListRequest, TextFilters, TextHistoryFilters, TextSort,
};

/// A text together with the facts needed for access checks.
#[derive(Debug, Clone)]
pub struct TextRecord {
    pub text: Text,
    pub language_id: Uuid,
    pub privacy: TextPrivacy,
}

impl TextRecord {
    pub fn author_profile_id(&self) -> Uuid {
        self.privacy.author_profile_id
    }
}

#[derive(Debug, Clone)]
pub struct NewText {
    pub title: String,
    pub content: String,
    pub audio: String,
    pub image: String,
    pub language_id: Uuid,
    /// Appended at the end of the collection's order.
    pub collection_id: Option<Uuid>,
    pub level: Option<LanguageLevel>,
    pub is_public: bool,
    pub added_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct TextChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub audio: Option<String>,
    pub image: Option<String>,
    pub is_public: Option<bool>,
    /// `Some(None)` clears the level.
    pub level: Option<Option<LanguageLevel>>,
    /// `Some(None)` makes the text standalone.
    pub collection_id: Option<Option<Uuid>>,
}

#[async_trait]
pub trait TextsRepository: Send + Sync {
    async fn list_texts(
        &self,
        request: &ListRequest<TextFilters, TextSort>,
    ) -> Result<Page<Text>>;
    async fn list_text_history(
        &self,
        request: &ListRequest<TextHistoryFilters, HistorySort>,
    ) -> Result<Page<TextHistoryEntry>>;
    /// Looks a text up regardless of visibility.
    async fn get_text(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Option<TextRecord>>;
    async fn create_text(&self, text: &NewText, viewer: Uuid) -> Result<Text>;
    async fn update_text(
        &self,
        id: Uuid,
        changes: &TextChanges,
        viewer: Uuid,
    ) -> Result<Text>;
    /// Closes the gap the text leaves in its collection's order.
    async fn delete_text(&self, id: Uuid) -> Result<()>;

    async fn record_view(&self, viewer: Uuid, text_id: Uuid) -> Result<()>;
    async fn bookmark_text(&self, bookmarker: Uuid, text_id: Uuid)
    -> Result<()>;
    async fn remove_text_bookmark(
        &self,
        bookmarker: Uuid,
        text_id: Uuid,
    ) -> Result<bool>;
    async fn hide_text(&self, hider: Uuid, text_id: Uuid) -> Result<()>;
    async fn unhide_text(&self, hider: Uuid, text_id: Uuid) -> Result<bool>;
}
