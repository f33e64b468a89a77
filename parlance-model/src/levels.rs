use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// CEFR-style difficulty attached to a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LanguageLevel {
    Beginner1,
    Beginner2,
    Intermediate1,
    Intermediate2,
    Advanced1,
    Advanced2,
}

impl LanguageLevel {
    pub const ALL: [LanguageLevel; 6] = [
        LanguageLevel::Beginner1,
        LanguageLevel::Beginner2,
        LanguageLevel::Intermediate1,
        LanguageLevel::Intermediate2,
        LanguageLevel::Advanced1,
        LanguageLevel::Advanced2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageLevel::Beginner1 => "beginner1",
            LanguageLevel::Beginner2 => "beginner2",
            LanguageLevel::Intermediate1 => "intermediate1",
            LanguageLevel::Intermediate2 => "intermediate2",
            LanguageLevel::Advanced1 => "advanced1",
            LanguageLevel::Advanced2 => "advanced2",
        }
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageLevel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ModelError::InvalidLanguageLevel(s.to_string()))
    }
}

/// How well a learner knows a saved vocab.
///
/// Serialized as its numeric value: `-1` ignored, `0` new, `1..=4` while
/// learning, `5` learned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "i16", try_from = "i16"))]
pub enum VocabLevel {
    Ignored,
    #[default]
    New,
    Level1,
    Level2,
    Level3,
    Level4,
    Learned,
}

impl VocabLevel {
    pub fn as_i16(self) -> i16 {
        match self {
            VocabLevel::Ignored => -1,
            VocabLevel::New => 0,
            VocabLevel::Level1 => 1,
            VocabLevel::Level2 => 2,
            VocabLevel::Level3 => 3,
            VocabLevel::Level4 => 4,
            VocabLevel::Learned => 5,
        }
    }
}

impl From<VocabLevel> for i16 {
    fn from(level: VocabLevel) -> Self {
        level.as_i16()
    }
}

impl TryFrom<i16> for VocabLevel {
    type Error = ModelError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Ok(match value {
            -1 => VocabLevel::Ignored,
            0 => VocabLevel::New,
            1 => VocabLevel::Level1,
            2 => VocabLevel::Level2,
            3 => VocabLevel::Level3,
            4 => VocabLevel::Level4,
            5 => VocabLevel::Learned,
            other => return Err(ModelError::InvalidVocabLevel(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_levels_parse_from_their_names() {
        for level in LanguageLevel::ALL {
            assert_eq!(level.as_str().parse::<LanguageLevel>(), Ok(level));
        }
        assert!("expert".parse::<LanguageLevel>().is_err());
    }

    #[test]
    fn vocab_levels_map_to_storage_values() {
        assert_eq!(VocabLevel::try_from(-1), Ok(VocabLevel::Ignored));
        assert_eq!(VocabLevel::try_from(5), Ok(VocabLevel::Learned));
        assert_eq!(i16::from(VocabLevel::Level3), 3);
        assert_eq!(
            VocabLevel::try_from(6),
            Err(ModelError::InvalidVocabLevel(6))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn vocab_level_serializes_as_number() {
        let json = serde_json::to_string(&VocabLevel::Level2).unwrap();
        assert_eq!(json, "2");
        let parsed: VocabLevel = serde_json::from_str("-1").unwrap();
        assert_eq!(parsed, VocabLevel::Ignored);
        assert!(serde_json::from_str::<VocabLevel>("9").is_err());
    }
}
