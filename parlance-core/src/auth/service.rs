use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parlance_model::requests::{LoginRequest, SignUpRequest};
use parlance_model::{SessionToken, User};
use tracing::{info, warn};

use super::crypto::AuthCrypto;
use crate::application::AppUnitOfWork;
use crate::database::ports::sessions::SessionsRepository;
use crate::database::ports::users::{NewUser, UsersRepository};
use crate::error::{CoreError, Result};
use crate::validation::{
    FieldErrors, check_email, check_password, check_username,
};

/// Accounts and opaque-token sessions.
#[derive(Clone)]
pub struct AuthService {
    crypto: Arc<AuthCrypto>,
    users: Arc<dyn UsersRepository>,
    sessions: Arc<dyn SessionsRepository>,
    session_ttl: Duration,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        crypto: Arc<AuthCrypto>,
        unit_of_work: &AppUnitOfWork,
        session_ttl: Duration,
    ) -> Self {
        Self {
            crypto,
            users: unit_of_work.users.clone(),
            sessions: unit_of_work.sessions.clone(),
            session_ttl,
        }
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<User> {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, &request.username);
        check_email(&mut errors, request.email.trim());
        check_password(&mut errors, &request.password);
        errors.into_result()?;

        let password_hash = self.crypto.hash_password(&request.password)?;
        self.users
            .create_user(&NewUser {
                username: request.username.clone(),
                email: request.email.trim().to_lowercase(),
                password_hash,
            })
            .await
    }

    /// Verifies credentials and opens a session. The raw token is returned
    /// once and never stored.
    pub async fn login(&self, request: &LoginRequest) -> Result<SessionToken> {
        let invalid =
            || CoreError::Unauthorized("Invalid username or password".into());

        let Some(credentials) =
            self.users.get_credentials(&request.username).await?
        else {
            warn!("Login attempt for unknown user {:?}", request.username);
            return Err(invalid());
        };

        if !self
            .crypto
            .verify_password(&request.password, &credentials.password_hash)?
        {
            warn!("Failed login for {}", credentials.user.username);
            return Err(invalid());
        }

        let token = self.crypto.generate_token()?;
        let expires_at = Utc::now() + self.session_ttl;
        self.sessions
            .create_session(
                &self.crypto.hash_token(&token),
                credentials.user.id,
                expires_at,
            )
            .await?;
        self.users.record_login(credentials.user.id).await?;

        info!("User {} logged in", credentials.user.username);
        Ok(SessionToken { auth_token: token })
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.sessions
            .delete_session(&self.crypto.hash_token(token))
            .await
    }

    /// Resolves a raw token to its user; unknown or expired tokens are
    /// unauthorized.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        self.sessions
            .find_session_user(&self.crypto.hash_token(token), Utc::now())
            .await?
            .ok_or_else(|| {
                CoreError::Unauthorized("Invalid or expired session".into())
            })
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.sessions.delete_expired_sessions(Utc::now()).await
    }
}
