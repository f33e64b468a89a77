#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use axum_test::TestServer;
use parlance_core::auth::AuthCrypto;
use parlance_core::database::PostgresDatabase;
use parlance_core::database::ports::languages::NewLanguage;
use parlance_model::Language;
use parlance_server::{AppState, create_app, infra::config::Config};
use serde_json::{Value, json};
use sqlx::PgPool;

pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

pub async fn build_test_app(pool: PgPool) -> Result<TestApp> {
    let db = Arc::new(PostgresDatabase::from_pool(pool));
    let crypto = AuthCrypto::for_tests("test-pepper", "test-token-key")
        .context("failed to build test crypto")?;
    let state = AppState::new(db, crypto, Config::for_dev(None))?;

    let server = TestServer::new(create_app(state.clone()))
        .map_err(|err| anyhow!(err.to_string()))?;
    Ok(TestApp { server, state })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

impl TestApp {
    pub async fn language(&self, code: &str, name: &str) -> Result<Language> {
        self.add_language(code, name, true).await
    }

    pub async fn add_language(
        &self,
        code: &str,
        name: &str,
        is_supported: bool,
    ) -> Result<Language> {
        self.state
            .unit_of_work()
            .languages
            .create_language(&NewLanguage {
                code: code.to_string(),
                name: name.to_string(),
                greeting: String::new(),
                flag: None,
                is_supported,
            })
            .await
            .context("create language")
    }

    /// Signs a user up and logs in, returning the session token.
    pub async fn sign_in(&self, username: &str) -> String {
        self.server
            .post("/api/v1/users")
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": PASSWORD,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = self
            .server
            .post("/api/v1/sessions")
            .json(&json!({ "username": username, "password": PASSWORD }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["authToken"]
            .as_str()
            .unwrap_or_else(|| panic!("missing authToken for {username}"))
            .to_string()
    }

    /// Signs in and starts learning `code`.
    pub async fn learner(&self, username: &str, code: &str) -> String {
        let token = self.sign_in(username).await;
        self.server
            .post("/api/v1/users/me/languages")
            .add_header("Authorization", bearer(&token))
            .json(&json!({ "languageCode": code }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        token
    }

    pub async fn create_text(&self, token: &str, body: Value) -> Value {
        let response = self
            .server
            .post("/api/v1/texts")
            .add_header("Authorization", bearer(token))
            .json(&body)
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    pub async fn create_collection(&self, token: &str, body: Value) -> Value {
        let response = self
            .server
            .post("/api/v1/collections")
            .add_header("Authorization", bearer(token))
            .json(&body)
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }
}
