use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{MaybeUser, RequireUser};
use crate::errors::AppError;
use crate::models::{PublicPrompt, UNTITLED_PROMPT};
use crate::state::AppState;
use crate::store::prompts;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePromptRequest {
    pub title: Option<String>,
    /// Older clients send `content`, newer ones `prompt`.
    pub content: Option<String>,
    pub prompt: Option<String>,
}

impl CreatePromptRequest {
    fn title(&self) -> &str {
        self.title.as_deref().map(str::trim).unwrap_or_default()
    }

    fn body(&self) -> &str {
        self.content
            .as_deref()
            .or(self.prompt.as_deref())
            .map(str::trim)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct FavoriteQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Positive integer id from a path segment.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::Validation("invalid id".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Saved prompts
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/prompts
///
/// Anonymous callers have no server-side prompts.
pub async fn handle_list_prompts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<PublicPrompt>>, AppError> {
    let Some(user) = user else {
        return Ok(Json(Vec::new()));
    };
    let rows = prompts::list_for_user(&state.db, user.id).await?;
    Ok(Json(rows.into_iter().map(PublicPrompt::from).collect()))
}

/// POST /api/v1/prompts
pub async fn handle_create_prompt(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<PublicPrompt>), AppError> {
    let (title, body) = (req.title(), req.body());
    if title.is_empty() || body.is_empty() {
        return Err(AppError::Validation(
            "title and prompt (or content) are required".to_string(),
        ));
    }
    let row = prompts::create(&state.db, user.map(|u| u.id), title, body).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// GET /api/v1/prompts/:id
pub async fn handle_get_prompt(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(raw_id): Path<String>,
) -> Result<Json<PublicPrompt>, AppError> {
    let id = parse_id(&raw_id)?;
    let row = prompts::get_visible(&state.db, id, user.map(|u| u.id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prompt {id} not found")))?;
    Ok(Json(row.into()))
}

/// DELETE /api/v1/prompts/:id
pub async fn handle_delete_prompt(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(raw_id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    let id = parse_id(&raw_id)?;
    let visible = prompts::get_visible(&state.db, id, user.map(|u| u.id)).await?;
    if visible.is_none() || !prompts::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Prompt {id} not found")));
    }
    Ok(Json(OkResponse { ok: true }))
}

// ────────────────────────────────────────────────────────────────────────────
// Favorites
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/favorites
pub async fn handle_list_favorites(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<PublicPrompt>>, AppError> {
    let rows = prompts::list_for_user(&state.db, user.id).await?;
    Ok(Json(rows.into_iter().map(PublicPrompt::from).collect()))
}

/// POST /api/v1/favorites
///
/// Saving the same text twice returns the existing favorite with 200.
pub async fn handle_add_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<PublicPrompt>), AppError> {
    let body = req.body();
    if body.is_empty() {
        return Err(AppError::Validation("Empty prompt".to_string()));
    }
    let title = match req.title() {
        "" => UNTITLED_PROMPT,
        title => title,
    };

    if let Some(existing) = prompts::find_by_content(&state.db, user.id, body).await? {
        return Ok((StatusCode::OK, Json(existing.into())));
    }

    let row = prompts::create(&state.db, Some(user.id), title, body).await?;
    info!("User {} saved favorite {}", user.id, row.id);
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// DELETE /api/v1/favorites?id=
pub async fn handle_delete_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<FavoriteQuery>,
) -> Result<Json<OkResponse>, AppError> {
    let raw = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing id".to_string()))?;
    let not_found = || AppError::NotFound("Favorite not found".to_string());

    let id = raw.trim().parse::<i64>().map_err(|_| not_found())?;
    let owned = prompts::get(&state.db, id)
        .await?
        .is_some_and(|row| row.user_id == Some(user.id));
    if !owned {
        return Err(not_found());
    }
    prompts::delete(&state.db, id).await?;
    Ok(Json(OkResponse { ok: true }))
}
