use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Language {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub greeting: String,
    pub flag: Option<String>,
    pub is_supported: bool,
    pub learners_count: i64,
}

/// A language as seen from one learner's list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LearnerLanguage {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub language: Language,
    pub started_learning_on: DateTime<Utc>,
    pub last_opened: DateTime<Utc>,
}
