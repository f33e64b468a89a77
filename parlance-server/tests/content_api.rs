use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;

#[path = "support/mod.rs"]
mod support;

use support::{bearer, build_test_app};

fn titles(page: &Value) -> Vec<String> {
    page["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn private_texts_are_missing_for_others_and_forbidden_to_edit(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let author = app.sign_in("autora").await;
    let reader = app.sign_in("lector").await;

    let private = app
        .create_text(
            &author,
            json!({
                "languageCode": "es",
                "title": "Diario",
                "content": "Querido diario",
                "isPublic": false,
            }),
        )
        .await;
    let public = app
        .create_text(
            &author,
            json!({ "languageCode": "es", "title": "Cuento", "content": "Había una vez" }),
        )
        .await;
    assert_eq!(public["addedBy"], "autora");
    assert_eq!(public["language"], "es");

    let private_path = format!("/api/v1/texts/{}", private["id"].as_str().unwrap());
    let public_path = format!("/api/v1/texts/{}", public["id"].as_str().unwrap());

    app.server
        .get(&private_path)
        .add_header("Authorization", bearer(&reader))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .patch(&private_path)
        .add_header("Authorization", bearer(&reader))
        .json(&json!({ "title": "Mío" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .patch(&public_path)
        .add_header("Authorization", bearer(&reader))
        .json(&json!({ "title": "Mío" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .delete(&public_path)
        .add_header("Authorization", bearer(&reader))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .get(&private_path)
        .add_header("Authorization", bearer(&author))
        .await
        .assert_status_ok();

    let anonymous: Value = app.server.get("/api/v1/texts").await.json();
    assert_eq!(titles(&anonymous), vec!["Cuento"]);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn texts_join_only_own_collections_in_the_same_language(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    app.language("fr", "French").await?;
    let author = app.sign_in("autora").await;
    let other = app.sign_in("intruso").await;

    let collection = app
        .create_collection(
            &author,
            json!({ "languageCode": "es", "title": "Cuentos" }),
        )
        .await;
    let collection_id = collection["id"].as_str().unwrap();

    let foreign = app
        .server
        .post("/api/v1/texts")
        .add_header("Authorization", bearer(&other))
        .json(&json!({
            "languageCode": "es",
            "title": "Colado",
            "content": "No es mío",
            "collectionId": collection_id,
        }))
        .await;
    foreign.assert_status(StatusCode::FORBIDDEN);

    let mismatched = app
        .server
        .post("/api/v1/texts")
        .add_header("Authorization", bearer(&author))
        .json(&json!({
            "languageCode": "fr",
            "title": "Conte",
            "content": "Il était une fois",
            "collectionId": collection_id,
        }))
        .await;
    mismatched.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = mismatched.json();
    assert!(body["error"]["fields"]["collectionId"].is_string());
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn collection_order_follows_appends_and_reorders(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let author = app.sign_in("autora").await;

    let collection = app
        .create_collection(
            &author,
            json!({ "languageCode": "es", "title": "Curso", "description": "Lecciones" }),
        )
        .await;
    let collection_id = collection["id"].as_str().unwrap().to_string();

    let mut ids = Vec::new();
    for title in ["Uno", "Dos", "Tres"] {
        let text = app
            .create_text(
                &author,
                json!({
                    "languageCode": "es",
                    "title": title,
                    "content": "Texto",
                    "collectionId": collection_id,
                }),
            )
            .await;
        ids.push(text["id"].as_str().unwrap().to_string());
    }

    let detail: Value = app
        .server
        .get(&format!("/api/v1/collections/{collection_id}"))
        .await
        .json();
    let orders: Vec<i64> = detail["texts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|text| text["orderInCollection"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);

    let incomplete = app
        .server
        .patch(&format!("/api/v1/collections/{collection_id}"))
        .add_header("Authorization", bearer(&author))
        .json(&json!({ "textsOrder": [ids[0], ids[1]] }))
        .await;
    incomplete.assert_status(StatusCode::BAD_REQUEST);

    app.server
        .patch(&format!("/api/v1/collections/{collection_id}"))
        .add_header("Authorization", bearer(&author))
        .json(&json!({ "textsOrder": [ids[2], ids[0], ids[1]] }))
        .await
        .assert_status_ok();

    // The course and lesson aliases serve the same collection.
    let lessons: Value = app
        .server
        .get(&format!("/api/v1/courses/{collection_id}/lessons"))
        .add_query_param("sortBy", "orderInCollection")
        .await
        .json();
    assert_eq!(titles(&lessons), vec!["Tres", "Uno", "Dos"]);

    app.server
        .delete(&format!("/api/v1/lessons/{}", ids[2]))
        .add_header("Authorization", bearer(&author))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let detail: Value = app
        .server
        .get(&format!("/api/v1/collections/{collection_id}"))
        .await
        .json();
    let remaining: Vec<(String, i64)> = detail["texts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|text| {
            (
                text["title"].as_str().unwrap().to_string(),
                text["orderInCollection"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        remaining,
        vec![("Uno".to_string(), 0), ("Dos".to_string(), 1)]
    );
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn deleting_a_collection_keeps_texts_unless_cascading(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let author = app.sign_in("autora").await;

    let collection = app
        .create_collection(&author, json!({ "languageCode": "es", "title": "Curso" }))
        .await;
    let collection_id = collection["id"].as_str().unwrap().to_string();
    let text = app
        .create_text(
            &author,
            json!({
                "languageCode": "es",
                "title": "Suelto",
                "content": "Texto",
                "collectionId": collection_id,
            }),
        )
        .await;

    app.server
        .delete(&format!("/api/v1/collections/{collection_id}"))
        .add_query_param("cascadeTexts", "maybe")
        .add_header("Authorization", bearer(&author))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .delete(&format!("/api/v1/collections/{collection_id}"))
        .add_header("Authorization", bearer(&author))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let kept: Value = app
        .server
        .get(&format!("/api/v1/texts/{}", text["id"].as_str().unwrap()))
        .await
        .json();
    assert!(kept["collectionId"].is_null());
    assert!(kept["orderInCollection"].is_null());
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn list_parameters_are_validated(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;

    let response = app
        .server
        .get("/api/v1/texts")
        .add_query_param("page", "0")
        .add_query_param("pageSize", "1000")
        .add_query_param("sortBy", "popularity")
        .add_query_param("level", "beginner1,expert")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let fields = &body["error"]["fields"];
    for field in ["page", "pageSize", "sortBy", "level"] {
        assert!(fields[field].is_string(), "missing error for {field}");
    }

    let collections = app
        .server
        .get("/api/v1/collections")
        .add_query_param("languageCode", "Spanish")
        .await;
    collections.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn pages_report_their_count(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let author = app.sign_in("autora").await;

    for n in 1..=5 {
        app.create_text(
            &author,
            json!({ "languageCode": "es", "title": format!("Texto {n}"), "content": "Hola" }),
        )
        .await;
    }

    let page: Value = app
        .server
        .get("/api/v1/texts")
        .add_query_param("pageSize", "2")
        .add_query_param("page", "3")
        .add_query_param("sortBy", "title")
        .add_query_param("sortOrder", "asc")
        .await
        .json();
    assert_eq!(page["page"], 3);
    assert_eq!(page["pageSize"], 2);
    assert_eq!(page["pageCount"], 3);
    assert_eq!(titles(&page), vec!["Texto 5"]);

    let past_the_end: Value = app
        .server
        .get("/api/v1/texts")
        .add_query_param("pageSize", "2")
        .add_query_param("page", "4")
        .await
        .json();
    assert_eq!(past_the_end["page"], 4);
    assert_eq!(past_the_end["pageCount"], 3);
    assert_eq!(past_the_end["data"], json!([]));
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn unreadable_bodies_and_paths_get_the_error_body(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let author = app.sign_in("autora").await;

    let response = app
        .server
        .post("/api/v1/texts")
        .add_header("Authorization", bearer(&author))
        .json(&json!({
            "languageCode": "es",
            "title": "Nivel",
            "content": "Hola",
            "level": "expert",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"]["fields"]["level"].is_string());

    for path in ["/api/v1/texts/not-a-uuid", "/api/v1/collections/42"] {
        let response = app.server.get(path).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["status"], 400, "{path}");
    }
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn text_filters_narrow_the_listing(pool: PgPool) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    app.language("fr", "French").await?;
    let author = app.sign_in("autora").await;
    let other = app.sign_in("otro").await;

    for (token, code, title, audio) in [
        (&author, "es", "Con audio", "https://cdn.parlance.test/a.mp3"),
        (&author, "es", "Sin audio", ""),
        (&author, "fr", "Bonjour", ""),
        (&other, "es", "Ajeno", ""),
    ] {
        app.create_text(
            token,
            json!({
                "languageCode": code,
                "title": title,
                "content": "Texto",
                "audio": audio,
            }),
        )
        .await;
    }

    let list = |pairs: &[(&str, &str)]| {
        let mut request = app.server.get("/api/v1/texts");
        for (key, value) in pairs {
            request = request.add_query_param(key, value);
        }
        request
    };

    let french: Value = list(&[("languageCode", "fr")]).await.json();
    assert_eq!(titles(&french), vec!["Bonjour"]);

    let with_audio: Value =
        list(&[("languageCode", "es"), ("hasAudio", "true")]).await.json();
    assert_eq!(titles(&with_audio), vec!["Con audio"]);

    let without_audio: Value =
        list(&[("languageCode", "es"), ("hasAudio", "false")]).await.json();
    assert_eq!(titles(&without_audio), vec!["Ajeno", "Sin audio"]);

    let by_author: Value = list(&[("addedBy", "AUTORA")]).await.json();
    assert_eq!(titles(&by_author), vec!["Bonjour", "Con audio", "Sin audio"]);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn standalone_texts_sort_after_collection_texts(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let author = app.sign_in("autora").await;

    let course = app
        .create_collection(&author, json!({ "languageCode": "es", "title": "Curso" }))
        .await;
    for title in ["Primera", "Segunda"] {
        app.create_text(
            &author,
            json!({
                "languageCode": "es",
                "title": title,
                "content": "Hola",
                "collectionId": course["id"],
            }),
        )
        .await;
    }
    app.create_text(
        &author,
        json!({ "languageCode": "es", "title": "Suelta", "content": "Hola" }),
    )
    .await;

    for (order, expected) in [
        ("asc", ["Primera", "Segunda", "Suelta"]),
        ("desc", ["Segunda", "Primera", "Suelta"]),
    ] {
        let page: Value = app
            .server
            .get("/api/v1/texts")
            .add_query_param("sortBy", "orderInCollection")
            .add_query_param("sortOrder", order)
            .await
            .json();
        assert_eq!(titles(&page), expected, "sortOrder={order}");
    }
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn collections_sort_by_average_viewers_then_title(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let author = app.sign_in("autora").await;
    let readers = [app.sign_in("lector").await, app.sign_in("lectora").await];

    let mut popular = Value::Null;
    for title in ["Beta", "Alfa", "Gamma"] {
        let collection = app
            .create_collection(&author, json!({ "languageCode": "es", "title": title }))
            .await;
        let text = app
            .create_text(
                &author,
                json!({
                    "languageCode": "es",
                    "title": format!("{title} 1"),
                    "content": "Hola",
                    "collectionId": collection["id"],
                }),
            )
            .await;
        if title == "Gamma" {
            popular = text;
        }
    }
    for reader in &readers {
        app.server
            .post("/api/v1/users/me/texts/history")
            .add_header("Authorization", bearer(reader))
            .json(&json!({ "textId": popular["id"] }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    for (order, expected) in [
        ("asc", ["Alfa", "Beta", "Gamma"]),
        ("desc", ["Gamma", "Alfa", "Beta"]),
    ] {
        let page: Value = app
            .server
            .get("/api/v1/collections")
            .add_query_param("sortBy", "avgPastViewersCountPerText")
            .add_query_param("sortOrder", order)
            .await
            .json();
        assert_eq!(titles(&page), expected, "sortOrder={order}");
    }
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn reader_lists_track_bookmarks_history_and_hidden_texts(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let author = app.sign_in("autora").await;
    let reader = app.sign_in("lector").await;

    let text = app
        .create_text(
            &author,
            json!({ "languageCode": "es", "title": "Leído", "content": "Hola" }),
        )
        .await;
    app.create_text(
        &author,
        json!({ "languageCode": "es", "title": "Otro", "content": "Adiós" }),
    )
    .await;
    let text_ref = json!({ "textId": text["id"] });

    let bookmarked = app
        .server
        .post("/api/v1/users/me/texts/bookmarked")
        .add_header("Authorization", bearer(&reader))
        .json(&text_ref)
        .await;
    bookmarked.assert_status(StatusCode::CREATED);
    let bookmarked: Value = bookmarked.json();
    assert_eq!(bookmarked["isBookmarked"], true);

    app.server
        .post("/api/v1/users/me/texts/bookmarked")
        .add_header("Authorization", bearer(&reader))
        .json(&text_ref)
        .await
        .assert_status(StatusCode::CONFLICT);

    for _ in 0..2 {
        app.server
            .post("/api/v1/users/me/texts/history")
            .add_header("Authorization", bearer(&reader))
            .json(&text_ref)
            .await
            .assert_status(StatusCode::CREATED);
    }
    let history: Value = app
        .server
        .get("/api/v1/users/me/texts/history")
        .add_header("Authorization", bearer(&reader))
        .await
        .json();
    assert_eq!(titles(&history), vec!["Leído", "Leído"]);
    assert!(history["data"][0]["timeViewed"].is_string());
    assert_eq!(history["data"][0]["pastViewersCount"], 1);

    app.server
        .post("/api/v1/users/me/texts/hidden")
        .add_header("Authorization", bearer(&reader))
        .json(&text_ref)
        .await
        .assert_status(StatusCode::CREATED);
    let visible: Value = app
        .server
        .get("/api/v1/texts")
        .add_header("Authorization", bearer(&reader))
        .await
        .json();
    assert_eq!(titles(&visible), vec!["Otro"]);

    let saved: Value = app
        .server
        .get("/api/v1/users/me/texts/bookmarked")
        .add_header("Authorization", bearer(&reader))
        .await
        .json();
    assert_eq!(titles(&saved), vec!["Leído"]);

    let id = text["id"].as_str().unwrap();
    app.server
        .delete(&format!("/api/v1/users/me/texts/hidden/{id}"))
        .add_header("Authorization", bearer(&reader))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .delete(&format!("/api/v1/users/me/texts/bookmarked/{id}"))
        .add_header("Authorization", bearer(&reader))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .delete(&format!("/api/v1/users/me/texts/bookmarked/{id}"))
        .add_header("Authorization", bearer(&reader))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test(migrator = "parlance_core::MIGRATOR")]
async fn private_collections_can_be_bookmarked_only_by_their_author(
    pool: PgPool,
) -> Result<()> {
    let app = build_test_app(pool).await?;
    app.language("es", "Spanish").await?;
    let author = app.sign_in("autora").await;
    let reader = app.sign_in("lector").await;

    let private = app
        .create_collection(
            &author,
            json!({ "languageCode": "es", "title": "Borrador", "isPublic": false }),
        )
        .await;
    let collection_ref = json!({ "collectionId": private["id"] });

    app.server
        .post("/api/v1/users/me/collections/bookmarked")
        .add_header("Authorization", bearer(&reader))
        .json(&collection_ref)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .post("/api/v1/users/me/collections/bookmarked")
        .add_header("Authorization", bearer(&author))
        .json(&collection_ref)
        .await
        .assert_status(StatusCode::CREATED);

    let saved: Value = app
        .server
        .get("/api/v1/users/me/collections/bookmarked")
        .add_header("Authorization", bearer(&author))
        .await
        .json();
    assert_eq!(titles(&saved), vec!["Borrador"]);

    let listed: Value = app.server.get("/api/v1/courses").await.json();
    assert!(titles(&listed).is_empty());
    Ok(())
}
