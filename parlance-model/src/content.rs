use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::levels::LanguageLevel;

/// A readable text, serialized for one viewer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Text {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub audio: String,
    pub image: String,
    /// Language code.
    pub language: String,
    pub level: Option<LanguageLevel>,
    pub collection_id: Option<Uuid>,
    pub order_in_collection: Option<i32>,
    pub is_public: bool,
    /// Author username.
    pub added_by: String,
    pub added_on: DateTime<Utc>,
    pub past_viewers_count: i64,
    pub is_bookmarked: bool,
}

/// One entry of a learner's reading history.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TextHistoryEntry {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub text: Text,
    pub time_viewed: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Collection {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
    pub language: String,
    pub is_public: bool,
    pub added_by: String,
    pub added_on: DateTime<Utc>,
    pub avg_past_viewers_count_per_text: f64,
    pub is_bookmarked: bool,
    /// Only populated on single-collection lookups; lists leave it out.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub texts: Option<Vec<Text>>,
}
