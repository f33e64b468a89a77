//! Body and path extractors whose rejections use the `AppError` body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::infra::errors::AppError;

/// `axum::Json` that reports malformed or mistyped bodies as field errors.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` that reports unparsable segments as JSON errors.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
