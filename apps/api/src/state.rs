use std::sync::Arc;

use sqlx::SqlitePool;

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::inference::InferenceRouter;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// File-backed configuration of industries, formats and fields.
    pub catalog: Arc<CatalogStore>,
    /// Provider fan-out for `/api/v1/generate`.
    pub inference: Arc<InferenceRouter>,
    /// Present only when an OpenAI key is configured; otherwise the
    /// single-model path answers with a mock.
    pub llm: Option<LlmClient>,
    pub config: Config,
}
