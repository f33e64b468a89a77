//! The shared vocabulary and each learner's saved vocabs.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use parlance_core::FieldErrors;
use parlance_core::database::ports::vocabs::{
    LearnerVocabChanges, NewVocab, VocabRecord,
};
use parlance_core::parsing::normalize_vocab;
use parlance_core::query::ListParams;
use parlance_core::validation::{
    NOTES_MAX_LEN, VOCAB_MAX_LEN, check_max_len, check_required_text,
};
use parlance_model::requests::{
    CreateVocabRequest, UpdateLearnerVocabRequest, VocabRefRequest,
};
use parlance_model::{LearnerVocab, Meaning, Page, User, Vocab, VocabLevel};
use tracing::{info, warn};
use uuid::Uuid;

use super::supported_language;
use crate::auth::CurrentUser;
use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};
use crate::infra::extract::{AppJson, AppPath};

pub(crate) async fn find_vocab(
    state: &AppState,
    id: Uuid,
) -> AppResult<VocabRecord> {
    state
        .unit_of_work()
        .vocabs
        .get_vocab(id)
        .await?
        .ok_or_else(|| {
            warn!("Vocab {} not found", id);
            AppError::not_found("Vocab not found")
        })
}

/// Learners only save vocabulary of languages they are learning.
pub(crate) async fn require_learning(
    state: &AppState,
    user: &User,
    language_id: Uuid,
    field: &str,
) -> AppResult<()> {
    let learning = state
        .unit_of_work()
        .languages
        .is_learning(user.profile.id, language_id)
        .await?;
    if !learning {
        warn!("{} is not learning language {}", user.username, language_id);
        return Err(AppError::invalid_field(
            field,
            "You are not learning this language",
        ));
    }
    Ok(())
}

pub async fn list_vocabs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<Vocab>>> {
    let request = params.vocabs()?;
    let page = state.unit_of_work().vocabs.list_vocabs(&request).await?;
    Ok(Json(page))
}

/// Returns 201 for a new vocab and 200 when the normalized text already
/// exists in the language.
pub async fn create_vocab(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    AppJson(request): AppJson<CreateVocabRequest>,
) -> AppResult<(StatusCode, Json<Vocab>)> {
    let (text, detected_phrase) = normalize_vocab(&request.text);
    let mut errors = FieldErrors::new();
    check_required_text(&mut errors, "text", &text, VOCAB_MAX_LEN);
    errors.into_result()?;

    let language = supported_language(&state, &request.language_code).await?;
    let (vocab, created) = state
        .unit_of_work()
        .vocabs
        .get_or_create_vocab(&NewVocab {
            text,
            language_id: language.id,
            is_phrase: request.is_phrase.unwrap_or(detected_phrase),
        })
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(vocab)))
}

pub async fn get_vocab(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Vocab>> {
    Ok(Json(find_vocab(&state, id).await?.vocab))
}

pub async fn list_vocab_meanings(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Meaning>>> {
    find_vocab(&state, id).await?;
    let (filters, sort) = params.vocab_meanings(id)?;
    let meanings = state
        .unit_of_work()
        .meanings
        .list_meanings(&filters, sort)
        .await?;
    Ok(Json(meanings))
}

pub async fn list_learner_vocabs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<LearnerVocab>>> {
    let request = params.learner_vocabs(user.profile.id)?;
    let page = state
        .unit_of_work()
        .vocabs
        .list_learner_vocabs(&request)
        .await?;
    Ok(Json(page))
}

/// Saves a vocab at level new.
pub async fn save_learner_vocab(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<VocabRefRequest>,
) -> AppResult<(StatusCode, Json<LearnerVocab>)> {
    let record = find_vocab(&state, request.vocab_id).await?;
    require_learning(&state, &user, record.language_id, "vocabId").await?;

    let saved = state
        .unit_of_work()
        .vocabs
        .save_learner_vocab(user.profile.id, request.vocab_id, VocabLevel::New)
        .await?;
    info!("{} saved vocab {}", user.username, saved.text);
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn get_learner_vocab(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<LearnerVocab>> {
    state
        .unit_of_work()
        .vocabs
        .get_learner_vocab(user.profile.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_saved(&user, id))
}

pub async fn update_learner_vocab(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateLearnerVocabRequest>,
) -> AppResult<Json<LearnerVocab>> {
    let mut errors = FieldErrors::new();
    if let Some(notes) = &request.notes {
        check_max_len(&mut errors, "notes", notes, NOTES_MAX_LEN);
    }
    errors.into_result()?;

    let changes = LearnerVocabChanges {
        level: request.level,
        notes: request.notes,
    };
    state
        .unit_of_work()
        .vocabs
        .update_learner_vocab(user.profile.id, id, &changes)
        .await?
        .map(Json)
        .ok_or_else(|| not_saved(&user, id))
}

pub async fn delete_learner_vocab(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let removed = state
        .unit_of_work()
        .vocabs
        .delete_learner_vocab(user.profile.id, id)
        .await?;
    if !removed {
        return Err(not_saved(&user, id));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn not_saved(user: &User, vocab_id: Uuid) -> AppError {
    warn!("{} has not saved vocab {}", user.username, vocab_id);
    AppError::not_found("Vocab is not saved")
}
