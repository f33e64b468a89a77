use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::{
    AppState,
    auth::optional_auth_middleware,
    handlers::{
        collections, health, languages, meanings, texts, users, vocabs,
    },
};

/// Create all v1 API routes.
///
/// Every route resolves the caller from the session token when one is sent;
/// handlers that need a caller reject anonymous requests themselves.
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(create_account_routes())
        .merge(create_language_routes())
        .merge(create_vocab_routes())
        // Courses and lessons are the same resources under other names
        .nest("/collections", create_collection_routes())
        .nest("/courses", create_collection_routes())
        .nest("/texts", create_text_routes())
        .nest("/lessons", create_text_routes())
        .nest("/users/me/collections", create_collection_library_routes())
        .nest("/users/me/texts", create_text_library_routes())
        .layer(middleware::from_fn_with_state(state, optional_auth_middleware))
}

fn create_account_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::sign_up))
        .route("/sessions", post(users::login).delete(users::logout))
        .route(
            "/users/me",
            get(users::get_current_user).delete(users::delete_current_user),
        )
        .route("/users/me/profile", patch(users::update_profile))
        .route("/users/{username}", get(users::get_user))
}

fn create_language_routes() -> Router<AppState> {
    Router::new()
        .route("/languages", get(languages::list_languages))
        .route(
            "/users/me/languages",
            get(languages::list_my_languages)
                .post(languages::add_learner_language),
        )
        .route(
            "/users/me/languages/{code}",
            patch(languages::touch_learner_language)
                .delete(languages::remove_learner_language),
        )
        .route(
            "/users/{username}/languages",
            get(languages::list_learner_languages),
        )
}

fn create_collection_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(collections::list_collections)
                .post(collections::create_collection),
        )
        .route(
            "/{id}",
            get(collections::get_collection)
                .patch(collections::update_collection)
                .delete(collections::delete_collection),
        )
        .route("/{id}/texts", get(collections::list_collection_texts))
        .route("/{id}/lessons", get(collections::list_collection_texts))
}

fn create_text_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(texts::list_texts).post(texts::create_text))
        .route(
            "/{id}",
            get(texts::get_text)
                .patch(texts::update_text)
                .delete(texts::delete_text),
        )
}

fn create_collection_library_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bookmarked",
            get(collections::list_bookmarked_collections)
                .post(collections::bookmark_collection),
        )
        .route(
            "/bookmarked/{id}",
            delete(collections::remove_collection_bookmark),
        )
}

fn create_text_library_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/history",
            get(texts::list_history).post(texts::record_view),
        )
        .route(
            "/bookmarked",
            get(texts::list_bookmarked_texts).post(texts::bookmark_text),
        )
        .route("/bookmarked/{id}", delete(texts::remove_text_bookmark))
        .route("/hidden", post(texts::hide_text))
        .route("/hidden/{id}", delete(texts::unhide_text))
        .route("/{id}/vocabs", get(texts::text_vocabs))
}

fn create_vocab_routes() -> Router<AppState> {
    Router::new()
        .route("/vocabs", get(vocabs::list_vocabs).post(vocabs::create_vocab))
        .route("/vocabs/{id}", get(vocabs::get_vocab))
        .route("/vocabs/{id}/meanings", get(vocabs::list_vocab_meanings))
        .route(
            "/users/me/vocabs",
            get(vocabs::list_learner_vocabs).post(vocabs::save_learner_vocab),
        )
        .route(
            "/users/me/vocabs/{id}",
            get(vocabs::get_learner_vocab)
                .patch(vocabs::update_learner_vocab)
                .delete(vocabs::delete_learner_vocab),
        )
        .route("/meanings", post(meanings::create_meaning))
        .route(
            "/users/me/meanings",
            get(meanings::list_learner_meanings)
                .post(meanings::save_learner_meaning),
        )
        .route(
            "/users/me/meanings/{id}",
            delete(meanings::delete_learner_meaning),
        )
}
