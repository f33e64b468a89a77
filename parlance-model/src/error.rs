use std::fmt::{self, Display};

/// Errors produced when decoding model enums from their wire or storage form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    InvalidLanguageLevel(String),
    InvalidVocabLevel(i16),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidLanguageLevel(raw) => {
                write!(f, "invalid language level: {raw}")
            }
            ModelError::InvalidVocabLevel(raw) => {
                write!(f, "invalid vocab level: {raw}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
