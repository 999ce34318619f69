use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::catalog::models::{Catalog, Industry};
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/config
pub async fn handle_get_config(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.catalog.current().await.as_ref().clone())
}

/// PUT /api/v1/config
///
/// Replaces the whole catalog. Malformed documents are rejected with 400 and
/// the current catalog stays in place.
pub async fn handle_put_config(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    state.catalog.replace(body).await?;
    Ok(Json(json!({ "ok": true })))
}

/// GET /api/v1/industries
pub async fn handle_get_industries(State(state): State<AppState>) -> Json<Vec<Industry>> {
    Json(state.catalog.current().await.industries.clone())
}
