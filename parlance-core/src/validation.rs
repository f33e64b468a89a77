//! Field validation shared by request handling and query parameter parsing.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{4,20}$").expect("valid regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex")
});
static LANGUAGE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,3}$").expect("valid regex"));

pub const PASSWORD_MIN_LEN: usize = 8;
pub const TITLE_MAX_LEN: usize = 255;
pub const COLLECTION_DESCRIPTION_MAX_LEN: usize = 500;
pub const TEXT_CONTENT_MAX_LEN: usize = 50_000;
pub const BIO_MAX_LEN: usize = 512;
pub const VOCAB_MAX_LEN: usize = 255;
pub const MEANING_MAX_LEN: usize = 1000;
pub const NOTES_MAX_LEN: usize = 2048;

/// Per-field error messages, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("One or more fields are invalid")]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error; the first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

pub fn check_username(errors: &mut FieldErrors, username: &str) {
    if !USERNAME_RE.is_match(username) {
        errors.add(
            "username",
            "Username must be 4-20 characters of letters, digits and underscores",
        );
    }
}

pub fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.len() > 255 || !EMAIL_RE.is_match(email) {
        errors.add("email", "Email is invalid");
    }
}

pub fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password",
            format!("Password must be at least {PASSWORD_MIN_LEN} characters"),
        );
    }
}

pub fn is_language_code(code: &str) -> bool {
    LANGUAGE_CODE_RE.is_match(code)
}

pub fn check_language_code(errors: &mut FieldErrors, field: &str, code: &str) {
    if !is_language_code(code) {
        errors.add(field, "Language code is invalid");
    }
}

/// Trimmed length must fall in `1..=max`.
pub fn check_required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    max: usize,
) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.add(field, "Must not be empty");
    } else if len > max {
        errors.add(field, format!("Must be at most {max} characters"));
    }
}

pub fn check_max_len(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    max: usize,
) {
    if value.chars().count() > max {
        errors.add(field, format!("Must be at most {max} characters"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, "learner_01");
        assert!(errors.is_empty());

        check_username(&mut errors, "ab");
        assert!(errors.get("username").is_some());
    }

    #[test]
    fn first_error_per_field_is_kept() {
        let mut errors = FieldErrors::new();
        errors.add("title", "first");
        errors.add("title", "second");
        assert_eq!(errors.get("title"), Some("first"));
    }

    #[test]
    fn required_text_is_trimmed() {
        let mut errors = FieldErrors::new();
        check_required_text(&mut errors, "title", "   ", 10);
        assert_eq!(errors.get("title"), Some("Must not be empty"));

        let mut errors = FieldErrors::new();
        check_required_text(&mut errors, "title", "abcdefghijk", 10);
        assert!(errors.get("title").unwrap().contains("at most 10"));
    }

    #[test]
    fn language_codes_are_lowercase_iso() {
        assert!(is_language_code("es"));
        assert!(is_language_code("yue"));
        assert!(!is_language_code("ES"));
        assert!(!is_language_code("en-US"));
    }

    #[test]
    fn emails_need_an_at_and_a_domain() {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "reader@example.com");
        assert!(errors.is_empty());
        check_email(&mut errors, "reader.example.com");
        assert_eq!(errors.get("email"), Some("Email is invalid"));
    }
}
