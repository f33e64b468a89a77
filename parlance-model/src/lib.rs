//! Entity and response shapes shared across Parlance crates.
#![allow(missing_docs)]

pub mod content;
pub mod error;
pub mod language;
pub mod levels;
pub mod page;
pub mod requests;
pub mod user;
pub mod vocab;

pub use content::{Collection, Text, TextHistoryEntry};
pub use error::{ModelError, Result as ModelResult};
pub use language::{Language, LearnerLanguage};
pub use levels::{LanguageLevel, VocabLevel};
pub use page::Page;
pub use user::{PrivateUser, Profile, PublicUser, SessionToken, User};
pub use vocab::{LearnerVocab, Meaning, Vocab};
