use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::prompt::assembler::build_prompt;
use crate::prompt::selection::{FieldValue, Selection};
use crate::state::AppState;

/// Selection as posted by clients. Every member is optional; an empty body
/// builds the fallback prompt.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildPromptRequest {
    pub industry: String,
    pub experts: Vec<String>,
    pub expert_weights: HashMap<String, i64>,
    pub format: Option<String>,
    pub sub_option: String,
    pub extra_values: HashMap<String, Value>,
    pub exclusions: Vec<String>,
    pub user_task: String,
    pub refine: String,
}

#[derive(Debug, Serialize)]
pub struct BuildPromptResponse {
    pub prompt: String,
}

impl BuildPromptRequest {
    /// Replays the request through the selection transitions, so the same
    /// validation applies as for an interactive session.
    ///
    /// Experts and field ids the catalog no longer knows are dropped with a
    /// warning. A client working from an older catalog still gets a prompt.
    pub fn into_selection(self, catalog: &Catalog) -> Selection {
        let mut selection = Selection::new(catalog);
        if let Some(format) = self.format.as_deref().filter(|f| !f.is_empty()) {
            selection.set_format(format);
        }
        selection.set_industry(&self.industry);
        for name in &self.experts {
            if let Err(e) = selection.add_expert(catalog, name) {
                warn!("Skipping expert in build request: {e}");
            }
        }
        for (name, weight) in &self.expert_weights {
            selection.set_expert_weight(name, *weight);
        }
        selection.set_sub_option(&self.sub_option);

        for (id, raw) in &self.extra_values {
            if let Err(e) = selection.set_value(catalog, id, FieldValue::from_json(raw)) {
                warn!("Skipping value in build request: {e}");
            }
        }

        for exclusion in &self.exclusions {
            selection.add_exclusion(exclusion);
        }
        selection.set_user_task(&self.user_task);
        selection.set_refine(&self.refine);
        selection
    }
}

/// POST /api/v1/prompts/build
pub async fn handle_build_prompt(
    State(state): State<AppState>,
    Json(req): Json<BuildPromptRequest>,
) -> Result<Json<BuildPromptResponse>, AppError> {
    let catalog = state.catalog.current().await;
    let selection = req.into_selection(&catalog);
    let prompt = build_prompt(&catalog, &selection);
    debug!(
        "Built prompt for format '{}' ({} chars)",
        selection.format(),
        prompt.chars().count()
    );
    Ok(Json(BuildPromptResponse { prompt }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::DEFAULT_CATALOG_JSON;
    use serde_json::json;

    fn catalog() -> Catalog {
        serde_json::from_str(DEFAULT_CATALOG_JSON).unwrap()
    }

    fn request(body: Value) -> BuildPromptRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_empty_body_builds_default_selection() {
        let catalog = catalog();
        let selection = request(json!({})).into_selection(&catalog);
        assert_eq!(selection, Selection::new(&catalog));
    }

    #[test]
    fn test_request_maps_onto_selection() {
        let catalog = catalog();
        let selection = request(json!({
            "industry": "Retail",
            "experts": ["Analyst", "Strategist"],
            "expertWeights": {"Strategist": 130},
            "format": "presentation",
            "subOption": "Команда",
            "extraValues": {"slides": 10, "speakerNotes": true},
            "exclusions": [" жаргон ", "жаргон"],
            "userTask": "Q3 plan"
        }))
        .into_selection(&catalog);

        assert_eq!(selection.format(), "presentation");
        assert_eq!(selection.sub_option(), "Команда");
        assert_eq!(selection.weight("Strategist"), 100);
        assert_eq!(*selection.values().get("slides"), FieldValue::List("10".into()));
        assert_eq!(*selection.values().get("speakerNotes"), FieldValue::Bool(true));
        assert_eq!(selection.exclusions(), ["жаргон"]);
    }

    #[test]
    fn test_unknown_field_is_skipped() {
        let catalog = catalog();
        let selection = request(json!({"extraValues": {"columns": "A", "tone": "формальный"}}))
            .into_selection(&catalog);
        assert_eq!(*selection.values().get("columns"), FieldValue::Unset);
        assert_eq!(
            *selection.values().get("tone"),
            FieldValue::List("формальный".into())
        );
    }

    #[test]
    fn test_foreign_expert_is_skipped() {
        let catalog = catalog();
        let selection = request(json!({"industry": "IT", "experts": ["Analyst"]}))
            .into_selection(&catalog);
        assert!(selection.experts().is_empty());
        assert_eq!(selection.industry(), "IT");
    }
}
