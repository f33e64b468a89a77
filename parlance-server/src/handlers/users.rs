//! Accounts, sessions and profiles.

use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use parlance_core::FieldErrors;
use parlance_core::database::ports::users::ProfileChanges;
use parlance_core::validation::{BIO_MAX_LEN, check_max_len};
use parlance_model::requests::{
    LoginRequest, SignUpRequest, UpdateProfileRequest,
};
use parlance_model::{PrivateUser, PublicUser};
use tracing::info;

use super::profile_owner;
use crate::auth::middleware::{clear_session_cookie, session_cookie};
use crate::auth::{AuthToken, CurrentUser, Viewer};
use crate::infra::app_state::AppState;
use crate::infra::errors::AppResult;
use crate::infra::extract::{AppJson, AppPath};

const PROFILE_PICTURE_MAX_LEN: usize = 2048;

pub async fn sign_up(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<PrivateUser>)> {
    let user = state.auth_service().sign_up(&request).await?;
    Ok((StatusCode::CREATED, Json(PrivateUser::from(user))))
}

/// Issues a session token in the body and as the `session` cookie.
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Response> {
    let token = state.auth_service().login(&request).await?;
    let cookie = session_cookie(&token.auth_token, state.config.auth.session_ttl());

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(token),
    )
        .into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Extension(AuthToken(token)): Extension<AuthToken>,
) -> AppResult<Response> {
    state.auth_service().logout(&token).await?;
    info!("User {} logged out", user.username);

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
        .into_response())
}

/// Private view for the caller's own account, public view otherwise.
pub async fn get_user(
    State(state): State<AppState>,
    viewer: Viewer,
    AppPath(username): AppPath<String>,
) -> AppResult<Response> {
    let (user, is_self) = profile_owner(&state, &username, &viewer).await?;
    if is_self {
        Ok(Json(PrivateUser::from(user)).into_response())
    } else {
        Ok(Json(PublicUser::from(&user)).into_response())
    }
}

pub async fn get_current_user(
    CurrentUser(user): CurrentUser,
) -> Json<PrivateUser> {
    Json(PrivateUser::from(user))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<PrivateUser>> {
    let mut errors = FieldErrors::new();
    if let Some(bio) = &request.bio {
        check_max_len(&mut errors, "bio", bio, BIO_MAX_LEN);
    }
    if let Some(picture) = &request.profile_picture {
        check_max_len(
            &mut errors,
            "profilePicture",
            picture,
            PROFILE_PICTURE_MAX_LEN,
        );
    }
    errors.into_result()?;

    let changes = ProfileChanges {
        bio: request.bio,
        profile_picture: request.profile_picture,
        is_public: request.is_public,
    };
    let updated = state
        .unit_of_work()
        .users
        .update_profile(user.id, &changes)
        .await?;
    Ok(Json(PrivateUser::from(updated)))
}

pub async fn delete_current_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Response> {
    state.unit_of_work().users.delete_user(user.id).await?;
    info!("Deleted account {}", user.username);

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
        .into_response())
}
