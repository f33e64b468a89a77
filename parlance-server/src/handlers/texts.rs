//! Texts (also served as lessons), and the reader's history, bookmarks and
//! hidden texts.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use parlance_core::FieldErrors;
use parlance_core::database::ports::texts::{NewText, TextChanges};
use parlance_core::query::ListParams;
use parlance_core::validation::{
    TEXT_CONTENT_MAX_LEN, TITLE_MAX_LEN, check_required_text,
};
use parlance_model::requests::{
    CreateTextRequest, TextRefRequest, UpdateTextRequest,
};
use parlance_model::{LearnerVocab, Page, Text, TextHistoryEntry, User};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    authored_collection, authored_text, supported_language, visible_text,
};
use crate::auth::{CurrentUser, Viewer};
use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};
use crate::infra::extract::{AppJson, AppPath};

/// A text may only join one of the caller's collections in its own
/// language.
async fn check_placement(
    state: &AppState,
    collection_id: Uuid,
    language_id: Uuid,
    user: &User,
) -> AppResult<()> {
    let collection = authored_collection(state, collection_id, user).await?;
    if collection.language_id != language_id {
        return Err(AppError::invalid_field(
            "collectionId",
            "Collection is in a different language",
        ));
    }
    Ok(())
}

pub async fn list_texts(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<Text>>> {
    let request = params.texts(viewer.profile_id())?;
    let page = state.unit_of_work().texts.list_texts(&request).await?;
    Ok(Json(page))
}

pub async fn create_text(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<CreateTextRequest>,
) -> AppResult<(StatusCode, Json<Text>)> {
    let mut errors = FieldErrors::new();
    check_required_text(&mut errors, "title", &request.title, TITLE_MAX_LEN);
    check_required_text(
        &mut errors,
        "content",
        &request.content,
        TEXT_CONTENT_MAX_LEN,
    );
    errors.into_result()?;

    let language = supported_language(&state, &request.language_code).await?;
    if let Some(collection_id) = request.collection_id {
        check_placement(&state, collection_id, language.id, &user).await?;
    }

    let text = state
        .unit_of_work()
        .texts
        .create_text(
            &NewText {
                title: request.title.trim().to_string(),
                content: request.content,
                audio: request.audio,
                image: request.image,
                language_id: language.id,
                collection_id: request.collection_id,
                level: request.level,
                is_public: request.is_public,
                added_by: user.profile.id,
            },
            user.profile.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(text)))
}

pub async fn get_text(
    State(state): State<AppState>,
    viewer: Viewer,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Text>> {
    let record = visible_text(&state, id, viewer.profile_id()).await?;
    Ok(Json(record.text))
}

/// `level` and `collectionId` accept an explicit `null` to clear them.
pub async fn update_text(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateTextRequest>,
) -> AppResult<Json<Text>> {
    let record = authored_text(&state, id, &user).await?;

    let mut errors = FieldErrors::new();
    if let Some(title) = &request.title {
        check_required_text(&mut errors, "title", title, TITLE_MAX_LEN);
    }
    if let Some(content) = &request.content {
        check_required_text(
            &mut errors,
            "content",
            content,
            TEXT_CONTENT_MAX_LEN,
        );
    }
    errors.into_result()?;

    if let Some(Some(collection_id)) = request.collection_id
        && record.text.collection_id != Some(collection_id)
    {
        check_placement(&state, collection_id, record.language_id, &user)
            .await?;
    }

    let changes = TextChanges {
        title: request.title.map(|title| title.trim().to_string()),
        content: request.content,
        audio: request.audio,
        image: request.image,
        is_public: request.is_public,
        level: request.level,
        collection_id: request.collection_id,
    };
    let text = state
        .unit_of_work()
        .texts
        .update_text(id, &changes, user.profile.id)
        .await?;
    Ok(Json(text))
}

pub async fn delete_text(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    authored_text(&state, id, &user).await?;
    state.unit_of_work().texts.delete_text(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<TextHistoryEntry>>> {
    let request = params.text_history(user.profile.id)?;
    let page = state
        .unit_of_work()
        .texts
        .list_text_history(&request)
        .await?;
    Ok(Json(page))
}

/// Every call records a separate view.
pub async fn record_view(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<TextRefRequest>,
) -> AppResult<(StatusCode, Json<Text>)> {
    let id = request.text_id;
    visible_text(&state, id, Some(user.profile.id)).await?;
    state
        .unit_of_work()
        .texts
        .record_view(user.profile.id, id)
        .await?;

    let text = visible_text(&state, id, Some(user.profile.id)).await?.text;
    Ok((StatusCode::CREATED, Json(text)))
}

pub async fn list_bookmarked_texts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<Text>>> {
    let request = params.bookmarked_texts(user.profile.id)?;
    let page = state.unit_of_work().texts.list_texts(&request).await?;
    Ok(Json(page))
}

pub async fn bookmark_text(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<TextRefRequest>,
) -> AppResult<(StatusCode, Json<Text>)> {
    let id = request.text_id;
    visible_text(&state, id, Some(user.profile.id)).await?;
    state
        .unit_of_work()
        .texts
        .bookmark_text(user.profile.id, id)
        .await?;
    info!("{} bookmarked text {}", user.username, id);

    let text = visible_text(&state, id, Some(user.profile.id)).await?.text;
    Ok((StatusCode::CREATED, Json(text)))
}

pub async fn remove_text_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let removed = state
        .unit_of_work()
        .texts
        .remove_text_bookmark(user.profile.id, id)
        .await?;
    if !removed {
        warn!("{} has no bookmark on text {}", user.username, id);
        return Err(AppError::not_found("Text is not bookmarked"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Hidden texts drop out of the caller's `GET /texts` results.
pub async fn hide_text(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<TextRefRequest>,
) -> AppResult<StatusCode> {
    let id = request.text_id;
    visible_text(&state, id, Some(user.profile.id)).await?;
    state.unit_of_work().texts.hide_text(user.profile.id, id).await?;
    info!("{} hid text {}", user.username, id);
    Ok(StatusCode::CREATED)
}

pub async fn unhide_text(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let removed = state
        .unit_of_work()
        .texts
        .unhide_text(user.profile.id, id)
        .await?;
    if !removed {
        warn!("{} has not hidden text {}", user.username, id);
        return Err(AppError::not_found("Text is not hidden"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's saved vocabs that occur in the text.
pub async fn text_vocabs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Vec<LearnerVocab>>> {
    visible_text(&state, id, Some(user.profile.id)).await?;
    let vocabs = state
        .unit_of_work()
        .vocabs
        .learner_vocabs_in_text(user.profile.id, id)
        .await?;
    Ok(Json(vocabs))
}
