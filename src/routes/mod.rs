use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;

use crate::state::AppState;

pub mod health;
pub mod ships;

/// Assembles the full API router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api", ships::ship_routes())
        .fallback(not_found_handler)
        .with_state(state)
}

/// Unknown routes answer with the same envelope every error uses.
async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"success": false, "error": "Resource not found"})),
    )
}
