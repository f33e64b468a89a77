use async_trait::async_trait;
use parlance_model::{Collection, Page, Text};
use uuid::Uuid;

use crate::error::Result;
use crate::query::{CollectionFilters, CollectionSort, ListRequest};

/// A collection together with the facts needed for access checks.
#[derive(Debug, Clone)]
pub struct CollectionRecord {
    pub collection: Collection,
    pub language_id: Uuid,
    pub author_profile_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewCollection {
    pub title: String,
    pub description: String,
    pub image: String,
    pub language_id: Uuid,
    pub added_by: Uuid,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_public: Option<bool>,
    /// Must be a permutation of the collection's current text ids.
    pub texts_order: Option<Vec<Uuid>>,
}

#[async_trait]
pub trait CollectionsRepository: Send + Sync {
    async fn list_collections(
        &self,
        request: &ListRequest<CollectionFilters, CollectionSort>,
    ) -> Result<Page<Collection>>;
    /// Looks a collection up regardless of visibility.
    async fn get_collection(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Option<CollectionRecord>>;
    /// The texts of a collection visible to `viewer`, in collection order.
    async fn get_collection_texts(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Vec<Text>>;
    async fn create_collection(
        &self,
        collection: &NewCollection,
    ) -> Result<Collection>;
    async fn update_collection(
        &self,
        id: Uuid,
        changes: &CollectionChanges,
        viewer: Uuid,
    ) -> Result<Collection>;
    /// Without `cascade_texts` the texts are kept as standalone texts.
    async fn delete_collection(&self, id: Uuid, cascade_texts: bool)
    -> Result<()>;

    async fn bookmark_collection(
        &self,
        bookmarker: Uuid,
        collection_id: Uuid,
    ) -> Result<()>;
    async fn remove_collection_bookmark(
        &self,
        bookmarker: Uuid,
        collection_id: Uuid,
    ) -> Result<bool>;
}
