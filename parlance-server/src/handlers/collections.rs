//! Collections (also served as courses) and collection bookmarks.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use parlance_core::FieldErrors;
use parlance_core::database::ports::collections::{
    CollectionChanges, NewCollection,
};
use parlance_core::query::ListParams;
use parlance_core::validation::{
    COLLECTION_DESCRIPTION_MAX_LEN, TITLE_MAX_LEN, check_max_len,
    check_required_text,
};
use parlance_model::requests::{
    CollectionRefRequest, CreateCollectionRequest, UpdateCollectionRequest,
};
use parlance_model::{Collection, Page, Text};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{authored_collection, supported_language, visible_collection};
use crate::auth::{CurrentUser, Viewer};
use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};
use crate::infra::extract::{AppJson, AppPath};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCollectionQuery {
    pub cascade_texts: Option<String>,
}

impl DeleteCollectionQuery {
    fn cascade_texts(&self) -> AppResult<bool> {
        match self.cascade_texts.as_deref() {
            None | Some("false") => Ok(false),
            Some("true") => Ok(true),
            Some(_) => Err(AppError::invalid_field(
                "cascadeTexts",
                "Must be true or false",
            )),
        }
    }
}

pub async fn list_collections(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<Collection>>> {
    let request = params.collections(viewer.profile_id())?;
    let page = state
        .unit_of_work()
        .collections
        .list_collections(&request)
        .await?;
    Ok(Json(page))
}

pub async fn create_collection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<CreateCollectionRequest>,
) -> AppResult<(StatusCode, Json<Collection>)> {
    let mut errors = FieldErrors::new();
    check_required_text(&mut errors, "title", &request.title, TITLE_MAX_LEN);
    check_max_len(
        &mut errors,
        "description",
        &request.description,
        COLLECTION_DESCRIPTION_MAX_LEN,
    );
    errors.into_result()?;

    let language = supported_language(&state, &request.language_code).await?;
    let collection = state
        .unit_of_work()
        .collections
        .create_collection(&NewCollection {
            title: request.title.trim().to_string(),
            description: request.description,
            image: request.image,
            language_id: language.id,
            added_by: user.profile.id,
            is_public: request.is_public,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

/// The collection with the texts the caller may see, in collection order.
pub async fn get_collection(
    State(state): State<AppState>,
    viewer: Viewer,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Collection>> {
    let record = visible_collection(&state, id, viewer.profile_id()).await?;
    let texts = state
        .unit_of_work()
        .collections
        .get_collection_texts(id, viewer.profile_id())
        .await?;

    let mut collection = record.collection;
    collection.texts = Some(texts);
    Ok(Json(collection))
}

pub async fn update_collection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateCollectionRequest>,
) -> AppResult<Json<Collection>> {
    authored_collection(&state, id, &user).await?;

    let mut errors = FieldErrors::new();
    if let Some(title) = &request.title {
        check_required_text(&mut errors, "title", title, TITLE_MAX_LEN);
    }
    if let Some(description) = &request.description {
        check_max_len(
            &mut errors,
            "description",
            description,
            COLLECTION_DESCRIPTION_MAX_LEN,
        );
    }
    errors.into_result()?;

    let changes = CollectionChanges {
        title: request.title.map(|title| title.trim().to_string()),
        description: request.description,
        image: request.image,
        is_public: request.is_public,
        texts_order: request.texts_order,
    };
    let collection = state
        .unit_of_work()
        .collections
        .update_collection(id, &changes, user.profile.id)
        .await?;
    Ok(Json(collection))
}

/// Without `cascadeTexts=true` the collection's texts become standalone.
pub async fn delete_collection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    Query(query): Query<DeleteCollectionQuery>,
) -> AppResult<StatusCode> {
    let cascade_texts = query.cascade_texts()?;
    authored_collection(&state, id, &user).await?;
    state
        .unit_of_work()
        .collections
        .delete_collection(id, cascade_texts)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_collection_texts(
    State(state): State<AppState>,
    viewer: Viewer,
    AppPath(id): AppPath<Uuid>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<Text>>> {
    visible_collection(&state, id, viewer.profile_id()).await?;
    let request = params.collection_texts(id, viewer.profile_id())?;
    let page = state.unit_of_work().texts.list_texts(&request).await?;
    Ok(Json(page))
}

pub async fn list_bookmarked_collections(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<Collection>>> {
    let request = params.bookmarked_collections(user.profile.id)?;
    let page = state
        .unit_of_work()
        .collections
        .list_collections(&request)
        .await?;
    Ok(Json(page))
}

pub async fn bookmark_collection(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<CollectionRefRequest>,
) -> AppResult<(StatusCode, Json<Collection>)> {
    let id = request.collection_id;
    visible_collection(&state, id, Some(user.profile.id)).await?;
    state
        .unit_of_work()
        .collections
        .bookmark_collection(user.profile.id, id)
        .await?;
    info!("{} bookmarked collection {}", user.username, id);

    let collection = visible_collection(&state, id, Some(user.profile.id))
        .await?
        .collection;
    Ok((StatusCode::CREATED, Json(collection)))
}

pub async fn remove_collection_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let removed = state
        .unit_of_work()
        .collections
        .remove_collection_bookmark(user.profile.id, id)
        .await?;
    if !removed {
        warn!("{} has no bookmark on collection {}", user.username, id);
        return Err(AppError::not_found("Collection is not bookmarked"));
    }
    Ok(StatusCode::NO_CONTENT)
}
