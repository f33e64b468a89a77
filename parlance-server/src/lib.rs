//! # Parlance Server
//!
//! REST API for reading texts in a foreign language and keeping track of
//! the vocabulary met along the way.
//!
//! The server is built on Axum over PostgreSQL. Repositories and domain
//! rules live in `parlance-core`; this crate adds configuration, session
//! authentication and the `/api/v1` routes.

pub mod auth;
pub mod handlers;
pub mod infra;
pub mod routes;

use axum::{Router, http::HeaderValue};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub use infra::app_state::AppState;

/// The full application: versioned routes, CORS and request tracing.
pub fn create_app(state: AppState) -> Router {
    let cors_layer = if state.config.dev_mode || state.config.cors.is_wildcard()
    {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors
            .allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(routes::create_api_router(state.clone()))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
