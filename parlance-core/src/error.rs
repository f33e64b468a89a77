use thiserror::Error;

use crate::validation::FieldErrors;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("One or more fields are invalid")]
    Validation(FieldErrors),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a validation failure on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        CoreError::Validation(errors)
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }
}

impl From<FieldErrors> for CoreError {
    fn from(errors: FieldErrors) -> Self {
        CoreError::Validation(errors)
    }
}

/// Maps a unique-constraint violation to `Conflict`, leaving other failures
/// as internal errors carrying `context`.
pub(crate) fn map_unique_violation(
    err: sqlx::Error,
    constraints: &[(&str, &str)],
    context: &str,
) -> CoreError {
    if let Some(db_err) = err.as_database_error()
        && let Some(constraint) = db_err.constraint()
        && let Some((_, message)) =
            constraints.iter().find(|(name, _)| *name == constraint)
    {
        return CoreError::Conflict((*message).to_string());
    }
    CoreError::Internal(format!("{context}: {err}"))
}

pub type Result<T> = std::result::Result<T, CoreError>;
