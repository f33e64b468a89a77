use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;

#[path = "support/mod.rs"]
mod support;

use support::{TestApp, bearer, build_test_app};

async fn create_vocab(app: &TestApp, token: &str, text: &str) -> Value {
    let response = app
        .server
        .post("/api/v1/vocabs")
        .add_header("Authorization", bearer(token))
        .json(&json!({ "languageCode": "es", "text": text }))
        .await;
    assert!(
        response.status_code() == StatusCode::CREATED
            || response.status_code() == StatusCode::OK
    );
    response.json()
}

async fn save_vocab(app: &TestApp, token: &str, vocab: &Value) {
    app.server
        .post("/api/v1/users/me/vocabs")
        .add_header("Authorization", bearer(token))
        .json(&json!({ "vocabId": vocab["id"] }))
        .await
        .assert_status(StatusCode::CREATED);
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn learning_requires_a_supported_language(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    app.add_language("la", "Latin", false).await?;
    let token = app.sign_in("lector").await;

    let add = |code: &'static str| {
        app.server
            .post("/api/v1/users/me/languages")
            .add_header("Authorization", bearer(&token))
            .json(&json!({ "languageCode": code }))
    };

    add("la").await.assert_status(StatusCode::BAD_REQUEST);
    add("xx").await.assert_status(StatusCode::BAD_REQUEST);
    let created = add("es").await;
    created.assert_status(StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["code"], "es");
    assert!(body["lastOpened"].is_string());
    add("es").await.assert_status(StatusCode::CONFLICT);

    let languages: Value = app
        .server
        .get("/api/v1/users/lector/languages")
        .await
        .json();
    assert_eq!(languages.as_array().map(Vec::len), Some(1));

    let catalogue: Value = app
        .server
        .get("/api/v1/languages")
        .add_query_param("isSupported", "true")
        .await
        .json();
    let codes: Vec<&str> = catalogue
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|language| language["code"].as_str())
        .collect();
    assert_eq!(codes, vec!["es"]);
    assert_eq!(catalogue[0]["learnersCount"], 1);

    app.server
        .patch("/api/v1/users/me/languages/es")
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status_ok();
    app.server
        .patch("/api/v1/users/me/languages/la")
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn vocabs_are_normalized_and_shared(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let token = app.sign_in("lector").await;

    let first = app
        .server
        .post("/api/v1/vocabs")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "languageCode": "es", "text": "  Buenos   DÍAS " }))
        .await;
    first.assert_status(StatusCode::CREATED);
    let first: Value = first.json();
    assert_eq!(first["text"], "buenos días");
    assert_eq!(first["isPhrase"], true);

    let again = app
        .server
        .post("/api/v1/vocabs")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "languageCode": "es", "text": "buenos días" }))
        .await;
    again.assert_status(StatusCode::OK);
    let again: Value = again.json();
    assert_eq!(again["id"], first["id"]);

    let blank = app
        .server
        .post("/api/v1/vocabs")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "languageCode": "es", "text": " ¡! " }))
        .await;
    blank.assert_status(StatusCode::BAD_REQUEST);

    let symbols = app
        .server
        .post("/api/v1/vocabs")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "languageCode": "es", "text": "  C++  Lang " }))
        .await;
    symbols.assert_status(StatusCode::CREATED);
    let symbols: Value = symbols.json();
    assert_eq!(symbols["text"], "c lang");
    assert_eq!(symbols["isPhrase"], true);

    let found: Value = app
        .server
        .get("/api/v1/vocabs")
        .add_query_param("languageCode", "es")
        .add_query_param("searchQuery", "BUENOS")
        .await
        .json();
    assert_eq!(found["data"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn saving_vocab_needs_the_language_and_happens_once(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let outsider = app.sign_in("turista").await;
    let learner = app.learner("lector", "es").await;
    let vocab = create_vocab(&app, &learner, "hola").await;

    let refused = app
        .server
        .post("/api/v1/users/me/vocabs")
        .add_header("Authorization", bearer(&outsider))
        .json(&json!({ "vocabId": vocab["id"] }))
        .await;
    refused.assert_status(StatusCode::BAD_REQUEST);

    save_vocab(&app, &learner, &vocab).await;
    app.server
        .post("/api/v1/users/me/vocabs")
        .add_header("Authorization", bearer(&learner))
        .json(&json!({ "vocabId": vocab["id"] }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let path = format!("/api/v1/users/me/vocabs/{}", vocab["id"].as_str().unwrap());
    let updated = app
        .server
        .patch(&path)
        .add_header("Authorization", bearer(&learner))
        .json(&json!({ "level": 3, "notes": "saludo" }))
        .await;
    updated.assert_status_ok();
    let updated: Value = updated.json();
    assert_eq!(updated["level"], 3);
    assert_eq!(updated["notes"], "saludo");

    let filtered: Value = app
        .server
        .get("/api/v1/users/me/vocabs")
        .add_header("Authorization", bearer(&learner))
        .add_query_param("level", "1,2")
        .await
        .json();
    assert_eq!(filtered["data"].as_array().map(Vec::len), Some(0));

    let out_of_range = app
        .server
        .patch(&path)
        .add_header("Authorization", bearer(&learner))
        .json(&json!({ "level": 9 }))
        .await;
    out_of_range.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = out_of_range.json();
    assert!(body["error"]["fields"]["level"].is_string());

    app.server
        .delete(&path)
        .add_header("Authorization", bearer(&learner))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .get(&path)
        .add_header("Authorization", bearer(&learner))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn saving_a_meaning_saves_its_vocab(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    app.add_language("en", "English", false).await?;
    let learner = app.learner("lector", "es").await;
    let vocab = create_vocab(&app, &learner, "gato").await;

    let meaning = app
        .server
        .post("/api/v1/meanings")
        .add_header("Authorization", bearer(&learner))
        .json(&json!({ "vocabId": vocab["id"], "languageCode": "en", "text": "cat" }))
        .await;
    meaning.assert_status(StatusCode::CREATED);
    let meaning: Value = meaning.json();
    assert_eq!(meaning["addedBy"], "lector");

    app.server
        .post("/api/v1/meanings")
        .add_header("Authorization", bearer(&learner))
        .json(&json!({ "vocabId": vocab["id"], "languageCode": "en", "text": "cat" }))
        .await
        .assert_status(StatusCode::OK);

    let listed: Value = app
        .server
        .get(&format!(
            "/api/v1/vocabs/{}/meanings",
            vocab["id"].as_str().unwrap()
        ))
        .await
        .json();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    app.server
        .post("/api/v1/users/me/meanings")
        .add_header("Authorization", bearer(&learner))
        .json(&json!({ "meaningId": meaning["id"] }))
        .await
        .assert_status(StatusCode::CREATED);

    let saved_vocab: Value = app
        .server
        .get(&format!(
            "/api/v1/users/me/vocabs/{}",
            vocab["id"].as_str().unwrap()
        ))
        .add_header("Authorization", bearer(&learner))
        .await
        .json();
    assert_eq!(saved_vocab["level"], 0);

    let saved: Value = app
        .server
        .get("/api/v1/users/me/meanings")
        .add_header("Authorization", bearer(&learner))
        .add_query_param("vocabId", vocab["id"].as_str().unwrap())
        .await
        .json();
    assert_eq!(saved[0]["text"], "cat");

    app.server
        .delete(&format!(
            "/api/v1/users/me/meanings/{}",
            meaning["id"].as_str().unwrap()
        ))
        .add_header("Authorization", bearer(&learner))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn saved_vocabs_are_found_in_texts(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let learner = app.learner("lector", "es").await;

    for word in ["hola", "buenos días", "noches", "días buenos"] {
        let vocab = create_vocab(&app, &learner, word).await;
        save_vocab(&app, &learner, &vocab).await;
    }
    let text = app
        .create_text(
            &learner,
            json!({
                "languageCode": "es",
                "title": "Saludos",
                "content": "¡Hola! Buenos días, amigo.",
            }),
        )
        .await;

    let found: Value = app
        .server
        .get(&format!(
            "/api/v1/users/me/texts/{}/vocabs",
            text["id"].as_str().unwrap()
        ))
        .add_header("Authorization", bearer(&learner))
        .await
        .json();
    let mut words: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|vocab| vocab["text"].as_str())
        .collect();
    words.sort();
    assert_eq!(words, vec!["buenos días", "hola"]);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn dropping_a_language_resets_its_vocabulary(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let learner = app.learner("lector", "es").await;
    let vocab = create_vocab(&app, &learner, "hola").await;
    save_vocab(&app, &learner, &vocab).await;

    app.server
        .delete("/api/v1/users/me/languages/es")
        .add_header("Authorization", bearer(&learner))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .delete("/api/v1/users/me/languages/es")
        .add_header("Authorization", bearer(&learner))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let saved: Value = app
        .server
        .get("/api/v1/users/me/vocabs")
        .add_header("Authorization", bearer(&learner))
        .await
        .json();
    assert_eq!(saved["data"].as_array().map(Vec::len), Some(0));

    let shared: Value = app
        .server
        .get(&format!("/api/v1/vocabs/{}", vocab["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(shared["learnersCount"], 0);
    Ok(())
}
