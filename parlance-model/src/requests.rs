//! Request bodies accepted by the API.

use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

use crate::levels::{LanguageLevel, VocabLevel};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
#[cfg(feature = "serde")]
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AddLanguageRequest {
    pub language_code: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CreateCollectionRequest {
    pub language_code: String,
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub image: String,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub is_public: bool,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UpdateCollectionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_public: Option<bool>,
    /// Complete new ordering of the collection's texts.
    pub texts_order: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CreateTextRequest {
    pub language_code: String,
    pub title: String,
    pub content: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub collection_id: Option<Uuid>,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub is_public: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub level: Option<LanguageLevel>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub audio: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub image: String,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UpdateTextRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_public: Option<bool>,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "double_option")
    )]
    pub level: Option<Option<LanguageLevel>>,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "double_option")
    )]
    pub collection_id: Option<Option<Uuid>>,
    pub audio: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TextRefRequest {
    pub text_id: Uuid,
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CollectionRefRequest {
    pub collection_id: Uuid,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CreateVocabRequest {
    pub language_code: String,
    pub text: String,
    /// Inferred from whitespace in `text` when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_phrase: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct VocabRefRequest {
    pub vocab_id: Uuid,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UpdateLearnerVocabRequest {
    pub level: Option<VocabLevel>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CreateMeaningRequest {
    pub vocab_id: Uuid,
    pub language_code: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MeaningRefRequest {
    pub meaning_id: Uuid,
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}
