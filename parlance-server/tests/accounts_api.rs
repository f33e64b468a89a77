use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;

#[path = "support/mod.rs"]
mod support;

use support::{PASSWORD, bearer, build_test_app};

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn sign_up_returns_the_private_view(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;

    let response = app
        .server
        .post("/api/v1/users")
        .json(&json!({
            "username": "lector",
            "email": "  Lector@Example.com ",
            "password": PASSWORD,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["username"], "lector");
    assert_eq!(body["email"], "lector@example.com");
    assert_eq!(body["profile"]["isPublic"], true);
    assert!(body.get("passwordHash").is_none());

    let duplicate = app
        .server
        .post("/api/v1/users")
        .json(&json!({
            "username": "LECTOR",
            "email": "other@example.com",
            "password": PASSWORD,
        }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn sign_up_reports_each_invalid_field(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;

    let response = app
        .server
        .post("/api/v1/users")
        .json(&json!({ "username": "ab", "email": "nope", "password": "short" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let fields = &body["error"]["fields"];
    assert!(fields["username"].is_string());
    assert!(fields["email"].is_string());
    assert!(fields["password"].is_string());
    assert_eq!(body["error"]["status"], 400);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn missing_body_fields_are_reported_by_name(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;

    let response = app
        .server
        .post("/api/v1/users")
        .json(&json!({ "username": "lector", "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 400);
    assert_eq!(body["error"]["fields"]["email"], "This field is required");

    let response = app
        .server
        .post("/api/v1/sessions")
        .bytes(axum::body::Bytes::from_static(b"{\"username\": "))
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"]["message"].is_string());
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn login_sets_a_session_cookie(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    let token = app.sign_in("lector").await;

    let response = app
        .server
        .post("/api/v1/sessions")
        .json(&json!({ "username": "lector", "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let cookie = response.header("set-cookie");
    let cookie = cookie.to_str()?;
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let me = app
        .server
        .get("/api/v1/users/me")
        .add_header("Cookie", format!("session={token}"))
        .await;
    me.assert_status_ok();
    let body: Value = me.json();
    assert_eq!(body["email"], "lector@example.com");
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn wrong_password_is_unauthorized(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.sign_in("lector").await;

    let response = app
        .server
        .post("/api/v1/sessions")
        .json(&json!({ "username": "lector", "password": "not-the-password" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn logout_revokes_the_token(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    let token = app.sign_in("lector").await;

    let response = app
        .server
        .delete("/api/v1/sessions")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert!(response.header("set-cookie").to_str()?.contains("Max-Age=0"));

    app.server
        .get("/api/v1/users/me")
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn bad_tokens_are_rejected_even_on_public_routes(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;

    app.server.get("/api/v1/texts").await.assert_status_ok();
    app.server
        .get("/api/v1/texts")
        .add_header("Authorization", bearer("not-a-session"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .get("/api/v1/texts")
        .add_header("Authorization", "Basic abc")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .post("/api/v1/texts")
        .json(&json!({}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn private_profiles_are_only_visible_to_their_owner(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    let lector = app.sign_in("lector").await;
    let other = app.sign_in("curioso").await;

    let public: Value = app.server.get("/api/v1/users/lector").await.json();
    assert_eq!(public["username"], "lector");
    assert!(public.get("email").is_none());

    let response = app
        .server
        .patch("/api/v1/users/me/profile")
        .add_header("Authorization", bearer(&lector))
        .json(&json!({ "bio": "Aprendiendo", "isPublic": false }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["profile"]["bio"], "Aprendiendo");

    app.server
        .get("/api/v1/users/lector")
        .add_header("Authorization", bearer(&other))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get("/api/v1/users/lector/languages")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let own: Value = app
        .server
        .get("/api/v1/users/lector")
        .add_header("Authorization", bearer(&lector))
        .await
        .json();
    assert_eq!(own["email"], "lector@example.com");
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn bio_length_is_limited(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    let token = app.sign_in("lector").await;

    let response = app
        .server
        .patch("/api/v1/users/me/profile")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "bio": "x".repeat(513) }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"]["fields"]["bio"].is_string());
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn deleting_an_account_ends_its_sessions(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    let token = app.sign_in("lector").await;

    app.server
        .delete("/api/v1/users/me")
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get("/api/v1/users/me")
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .get("/api/v1/users/lector")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn health_reports_ok(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;

    let response = app.server.get("/api/v1/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok" }));
    Ok(())
}
