pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::catalog::handlers as catalog;
use crate::export::handlers as export;
use crate::inference::handlers as inference;
use crate::library::handlers as library;
use crate::prompt::handlers as prompt;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Configuration
        .route(
            "/api/v1/config",
            get(catalog::handle_get_config).put(catalog::handle_put_config),
        )
        .route("/api/v1/industries", get(catalog::handle_get_industries))
        // Prompt assembly and saved prompts
        .route("/api/v1/prompts/build", post(prompt::handle_build_prompt))
        .route(
            "/api/v1/prompts",
            get(library::handle_list_prompts).post(library::handle_create_prompt),
        )
        .route(
            "/api/v1/prompts/:id",
            get(library::handle_get_prompt).delete(library::handle_delete_prompt),
        )
        .route(
            "/api/v1/favorites",
            get(library::handle_list_favorites)
                .post(library::handle_add_favorite)
                .delete(library::handle_delete_favorite),
        )
        // Accounts
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/me", get(auth::handle_me))
        // Generation and export
        .route("/api/v1/generate", post(inference::handle_generate))
        .route("/api/v1/export", post(export::handle_export))
        .with_state(state)
}
