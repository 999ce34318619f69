use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Default title for favorites saved without one.
pub const UNTITLED_PROMPT: &str = "Промпт без названия";

#[derive(Debug, Clone, FromRow)]
pub struct PromptRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Shape returned by the prompt and favorite endpoints.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicPrompt {
    pub id: i64,
    pub title: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

impl From<PromptRow> for PublicPrompt {
    fn from(row: PromptRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            prompt: row.content,
            created_at: row.created_at,
        }
    }
}
