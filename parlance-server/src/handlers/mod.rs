//! HTTP handlers, one module per resource.
//!
//! Visibility failures are reported as 404 and authorship failures as 403.
//! The lookups shared between modules live here.

pub mod collections;
pub mod health;
pub mod languages;
pub mod meanings;
pub mod texts;
pub mod users;
pub mod vocabs;

use parlance_core::database::ports::collections::CollectionRecord;
use parlance_core::database::ports::texts::TextRecord;
use parlance_core::privacy::{collection_visible, text_visible};
use parlance_model::{Language, User};
use tracing::warn;
use uuid::Uuid;

use crate::auth::Viewer;
use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};

/// Path segment that stands for the signed-in user.
pub const ME: &str = "me";

/// A language named in a request body. Unknown codes are a field error.
pub(crate) async fn known_language(
    state: &AppState,
    code: &str,
) -> AppResult<Language> {
    let language = state
        .unit_of_work()
        .languages
        .get_language_by_code(code)
        .await?;
    language.ok_or_else(|| {
        AppError::invalid_field("languageCode", format!("Unknown language: {code}"))
    })
}

/// Like [`known_language`], but content may only be added in supported
/// languages.
pub(crate) async fn supported_language(
    state: &AppState,
    code: &str,
) -> AppResult<Language> {
    let language = known_language(state, code).await?;
    if !language.is_supported {
        return Err(AppError::invalid_field(
            "languageCode",
            format!("Language is not supported: {code}"),
        ));
    }
    Ok(language)
}

pub(crate) async fn visible_text(
    state: &AppState,
    id: Uuid,
    viewer: Option<Uuid>,
) -> AppResult<TextRecord> {
    match state.unit_of_work().texts.get_text(id, viewer).await? {
        Some(record) if text_visible(record.privacy, viewer) => Ok(record),
        _ => {
            warn!("Text {} not found or not visible", id);
            Err(AppError::not_found("Text not found"))
        }
    }
}

/// A text the caller may modify.
pub(crate) async fn authored_text(
    state: &AppState,
    id: Uuid,
    user: &User,
) -> AppResult<TextRecord> {
    let record = visible_text(state, id, Some(user.profile.id)).await?;
    if record.author_profile_id() != user.profile.id {
        warn!("User {} tried to modify text {}", user.username, id);
        return Err(AppError::forbidden("Only the author can modify this text"));
    }
    Ok(record)
}

pub(crate) async fn visible_collection(
    state: &AppState,
    id: Uuid,
    viewer: Option<Uuid>,
) -> AppResult<CollectionRecord> {
    let record = state
        .unit_of_work()
        .collections
        .get_collection(id, viewer)
        .await?;
    match record {
        Some(record)
            if collection_visible(
                record.collection.is_public,
                record.author_profile_id,
                viewer,
            ) =>
        {
            Ok(record)
        }
        _ => {
            warn!("Collection {} not found or not visible", id);
            Err(AppError::not_found("Collection not found"))
        }
    }
}

pub(crate) async fn authored_collection(
    state: &AppState,
    id: Uuid,
    user: &User,
) -> AppResult<CollectionRecord> {
    let record = visible_collection(state, id, Some(user.profile.id)).await?;
    if record.author_profile_id != user.profile.id {
        warn!("User {} tried to modify collection {}", user.username, id);
        return Err(AppError::forbidden(
            "Only the author can modify this collection",
        ));
    }
    Ok(record)
}

/// The account behind a `{username}` path segment, as seen by `viewer`.
///
/// `me` resolves to the caller (401 when signed out). Someone else's
/// private profile is reported as missing. The flag is true when the
/// account is the caller's own.
pub(crate) async fn profile_owner(
    state: &AppState,
    username: &str,
    viewer: &Viewer,
) -> AppResult<(User, bool)> {
    if username == ME {
        let user = viewer
            .0
            .clone()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;
        return Ok((user, true));
    }

    let user = state
        .unit_of_work()
        .users
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| {
            warn!("User {} not found", username);
            AppError::not_found("User not found")
        })?;

    let is_self = viewer.profile_id() == Some(user.profile.id);
    if !is_self && !user.profile.is_public {
        warn!("Profile of {} is private", username);
        return Err(AppError::not_found("User not found"));
    }
    Ok((user, is_self))
}
