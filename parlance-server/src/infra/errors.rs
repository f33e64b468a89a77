use axum::{
    Json,
    extract::{
        path::ErrorKind,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parlance_core::{CoreError, FieldErrors};
use serde_json::json;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub fields: Option<FieldErrors>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fields: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// A 400 naming the offending fields.
    pub fn invalid_fields(fields: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "One or more fields are invalid".to_string(),
            fields: Some(fields),
        }
    }

    /// A 400 for a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.add(field, message);
        Self::invalid_fields(fields)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "message": self.message,
            "status": self.status.as_u16(),
        });
        if let Some(fields) = self.fields {
            error["fields"] = json!(fields);
        }

        (self.status, Json(json!({ "error": error }))).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => Self::not_found(msg),
            CoreError::Conflict(msg) => Self::conflict(msg),
            CoreError::Validation(fields) => Self::invalid_fields(fields),
            CoreError::Forbidden(msg) => Self::forbidden(msg),
            CoreError::Unauthorized(msg) => Self::unauthorized(msg),
            CoreError::Database(err) => err.into(),
            CoreError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(fields: FieldErrors) -> Self {
        Self::invalid_fields(fields)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "unexpected failure");
        Self::internal("Internal server error")
    }
}

const JSON_DATA_PREFIX: &str =
    "Failed to deserialize the JSON body into the target type: ";

/// The field a serde data error points at, and what went wrong with it.
fn json_data_field(detail: &str) -> Option<(String, String)> {
    let detail = detail.strip_prefix(JSON_DATA_PREFIX).unwrap_or(detail);
    let detail = detail.split(" at line ").next().unwrap_or(detail);

    if let Some(rest) = detail.strip_prefix("missing field `") {
        let field = rest.split('`').next()?;
        return Some((field.to_string(), "This field is required".to_string()));
    }

    let (path, message) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then(|| (path.to_string(), message.to_string()))
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let detail = err.body_text();
                match json_data_field(&detail) {
                    Some((field, message)) => Self::invalid_field(&field, message),
                    None => Self::new(StatusCode::BAD_REQUEST, detail),
                }
            }
            JsonRejection::JsonSyntaxError(_) => {
                Self::new(StatusCode::BAD_REQUEST, "Request body is not valid JSON")
            }
            other => Self::new(other.status(), other.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => match err.kind() {
                ErrorKind::ParseErrorAtKey { key, .. } => {
                    Self::invalid_field(key, "Invalid value")
                }
                _ => Self::new(StatusCode::BAD_REQUEST, err.body_text()),
            },
            other => {
                tracing::error!(error = %other.body_text(), "path extraction failed");
                Self::new(other.status(), "Invalid request path")
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = ?err, "database operation failed");
        Self::internal("Database operation failed")
    }
}
