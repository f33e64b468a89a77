use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use parlance_model::User;
use uuid::Uuid;

use crate::infra::{app_state::AppState, errors::AppError};

pub const SESSION_COOKIE: &str = "session";

/// The raw token the current request authenticated with.
#[derive(Debug, Clone)]
pub struct AuthToken(pub String);

/// Resolves the caller when a token is supplied. A supplied but invalid or
/// expired token is rejected even on public routes.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = extract_token(request.headers())? {
        let user = state.auth_service().authenticate(&token).await?;
        request.extensions_mut().insert(user);
        request.extensions_mut().insert(AuthToken(token));
    }

    Ok(next.run(request).await)
}

/// `Authorization: Bearer <token>` or `Token <token>`, falling back to the
/// session cookie.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let raw = value
            .to_str()
            .map_err(|_| AppError::unauthorized("Malformed authorization header"))?;
        let token = raw
            .split_once(' ')
            .filter(|(scheme, _)| {
                scheme.eq_ignore_ascii_case("bearer")
                    || scheme.eq_ignore_ascii_case("token")
            })
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("Malformed authorization header"))?;
        return Ok(Some(token.to_string()));
    }

    Ok(session_cookie_value(headers))
}

fn session_cookie_value(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age: chrono::Duration) -> HeaderValue {
    let cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        max_age.num_seconds()
    );
    // Tokens are hex, so the cookie is always a valid header value.
    HeaderValue::from_str(&cookie)
        .unwrap_or_else(|_| HeaderValue::from_static("session=; Path=/"))
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// The caller if signed in. Never rejects.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn profile_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.profile.id)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Viewer(parts.extensions.get::<User>().cloned()))
    }
}

/// The signed-in caller; rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}
