use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::error;

use crate::infra::app_state::AppState;

/// Reports `ok` while the database answers, 503 otherwise.
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match sqlx::query("SELECT 1").execute(state.postgres.pool()).await {
        Ok(_) => Ok(Json(json!({ "status": "ok" }))),
        Err(err) => {
            error!(error = %err, "health check failed");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            ))
        }
    }
}
