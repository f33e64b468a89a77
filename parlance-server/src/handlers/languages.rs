use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use parlance_core::query::ListParams;
use parlance_model::requests::AddLanguageRequest;
use parlance_model::{Language, LearnerLanguage};
use tracing::{info, warn};

use super::{profile_owner, supported_language};
use crate::auth::{CurrentUser, Viewer};
use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};
use crate::infra::extract::{AppJson, AppPath};

pub async fn list_languages(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Language>>> {
    let (filters, sort) = params.languages()?;
    let languages = state
        .unit_of_work()
        .languages
        .list_languages(&filters, sort)
        .await?;
    Ok(Json(languages))
}

/// Languages someone is learning; private profiles are hidden like the
/// profile itself.
pub async fn list_learner_languages(
    State(state): State<AppState>,
    viewer: Viewer,
    AppPath(username): AppPath<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<LearnerLanguage>>> {
    let (user, _) = profile_owner(&state, &username, &viewer).await?;
    let (filters, sort) = params.learner_languages(user.profile.id)?;
    let languages = state
        .unit_of_work()
        .languages
        .list_learner_languages(&filters, sort)
        .await?;
    Ok(Json(languages))
}

pub async fn list_my_languages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<LearnerLanguage>>> {
    let (filters, sort) = params.learner_languages(user.profile.id)?;
    let languages = state
        .unit_of_work()
        .languages
        .list_learner_languages(&filters, sort)
        .await?;
    Ok(Json(languages))
}

pub async fn add_learner_language(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<AddLanguageRequest>,
) -> AppResult<(StatusCode, Json<LearnerLanguage>)> {
    let language = supported_language(&state, &request.language_code).await?;
    let learning = state
        .unit_of_work()
        .languages
        .add_learner_language(user.profile.id, language.id)
        .await?;
    info!("{} started learning {}", user.username, language.code);
    Ok((StatusCode::CREATED, Json(learning)))
}

/// Marks the language as opened now.
pub async fn touch_learner_language(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(code): AppPath<String>,
) -> AppResult<Json<LearnerLanguage>> {
    let language = language_in_path(&state, &code).await?;
    state
        .unit_of_work()
        .languages
        .touch_learner_language(user.profile.id, language.id)
        .await?
        .map(Json)
        .ok_or_else(|| not_learning(&user.username, &code))
}

pub async fn remove_learner_language(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(code): AppPath<String>,
) -> AppResult<StatusCode> {
    let language = language_in_path(&state, &code).await?;
    let removed = state
        .unit_of_work()
        .languages
        .remove_learner_language(user.profile.id, language.id)
        .await?;
    if !removed {
        return Err(not_learning(&user.username, &code));
    }
    info!("{} stopped learning {}", user.username, code);
    Ok(StatusCode::NO_CONTENT)
}

/// Path codes name a resource, so unknown ones are 404 rather than 400.
async fn language_in_path(state: &AppState, code: &str) -> AppResult<Language> {
    state
        .unit_of_work()
        .languages
        .get_language_by_code(code)
        .await?
        .ok_or_else(|| {
            warn!("Language {} not found", code);
            AppError::not_found("Language not found")
        })
}

fn not_learning(username: &str, code: &str) -> AppError {
    warn!("{} is not learning {}", username, code);
    AppError::not_found("Not learning this language")
}
