use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::levels::VocabLevel;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Vocab {
    pub id: Uuid,
    pub text: String,
    pub language: String,
    pub is_phrase: bool,
    pub learners_count: i64,
}

/// A vocab saved by a learner, with their progress on it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LearnerVocab {
    pub id: Uuid,
    pub text: String,
    pub language: String,
    pub is_phrase: bool,
    pub learners_count: i64,
    pub level: VocabLevel,
    pub notes: String,
    pub saved_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Meaning {
    pub id: Uuid,
    pub text: String,
    pub vocab_id: Uuid,
    pub language: String,
    /// `None` once the author's account is gone.
    pub added_by: Option<String>,
    pub added_on: DateTime<Utc>,
    pub learners_count: i64,
}
