use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::api::{QueryRequest, QueryResponse, ShipListResponse};
use crate::state::AppState;

pub fn ship_routes() -> Router<AppState> {
    Router::new()
        .route("/ships", get(list_ships_handler))
        .route("/query", post(query_handler))
}

/// Lists every known ship name.
pub async fn list_ships_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let ships = state.store.list_identities();
    Ok(Json(ShipListResponse::new(ships)))
}

/// Answers one free-text question about ships.
#[instrument(skip(state, payload))]
pub async fn query_handler(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let query = payload.query.unwrap_or_default();
    let answer = state.orchestrator.answer(&query).await?;
    info!(
        source_count = answer.sources.len(),
        "Query answered"
    );
    Ok(Json(QueryResponse::new(answer.response, answer.sources)))
}
