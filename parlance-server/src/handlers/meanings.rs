use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use parlance_core::FieldErrors;
use parlance_core::database::ports::meanings::NewMeaning;
use parlance_core::query::ListParams;
use parlance_core::validation::{MEANING_MAX_LEN, check_required_text};
use parlance_model::Meaning;
use parlance_model::requests::{CreateMeaningRequest, MeaningRefRequest};
use tracing::{info, warn};
use uuid::Uuid;

use super::known_language;
use super::vocabs::{find_vocab, require_learning};
use crate::auth::CurrentUser;
use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};
use crate::infra::extract::{AppJson, AppPath};

/// Meanings may be written in any known language, supported or not.
/// Returns 201 when created and 200 when an identical meaning exists.
pub async fn create_meaning(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<CreateMeaningRequest>,
) -> AppResult<(StatusCode, Json<Meaning>)> {
    let mut errors = FieldErrors::new();
    check_required_text(&mut errors, "text", &request.text, MEANING_MAX_LEN);
    errors.into_result()?;

    find_vocab(&state, request.vocab_id).await?;
    let language = known_language(&state, &request.language_code).await?;
    let (meaning, created) = state
        .unit_of_work()
        .meanings
        .get_or_create_meaning(&NewMeaning {
            text: request.text.trim().to_string(),
            vocab_id: request.vocab_id,
            language_id: language.id,
            added_by: user.profile.id,
        })
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(meaning)))
}

pub async fn list_learner_meanings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Meaning>>> {
    let (filters, sort) = params.learner_meanings(user.profile.id)?;
    let meanings = state
        .unit_of_work()
        .meanings
        .list_meanings(&filters, sort)
        .await?;
    Ok(Json(meanings))
}

/// Saving a meaning also saves its vocab when the learner has not yet.
pub async fn save_learner_meaning(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<MeaningRefRequest>,
) -> AppResult<(StatusCode, Json<Meaning>)> {
    let meanings = &state.unit_of_work().meanings;
    let meaning = meanings
        .get_meaning(request.meaning_id)
        .await?
        .ok_or_else(|| {
            warn!("Meaning {} not found", request.meaning_id);
            AppError::not_found("Meaning not found")
        })?;

    let vocab = find_vocab(&state, meaning.vocab_id).await?;
    require_learning(&state, &user, vocab.language_id, "meaningId").await?;

    meanings
        .save_learner_meaning(user.profile.id, meaning.id)
        .await?;
    info!("{} saved meaning {}", user.username, meaning.id);
    Ok((StatusCode::CREATED, Json(meaning)))
}

pub async fn delete_learner_meaning(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let removed = state
        .unit_of_work()
        .meanings
        .delete_learner_meaning(user.profile.id, id)
        .await?;
    if !removed {
        warn!("{} has not saved meaning {}", user.username, id);
        return Err(AppError::not_found("Meaning is not saved"));
    }
    Ok(StatusCode::NO_CONTENT)
}
