use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::inference::providers::truncate_chars;
use crate::inference::ProviderResult;
use crate::llm_client::DEFAULT_MODEL;
use crate::state::AppState;

const DEGRADED_MESSAGE: &str =
    "No providers requested — generation unavailable. Returning prompt only.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    /// Present (even empty) selects the fan-out mode. Non-string entries are
    /// ignored.
    pub providers: Option<Vec<Value>>,
    pub prompt: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateMode {
    Ok,
    Degraded,
    Mock,
    Openai,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GenerateResponse {
    FanOut {
        mode: GenerateMode,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'static str>,
        results: BTreeMap<String, ProviderResult>,
    },
    Single {
        mode: GenerateMode,
        model: String,
        output: String,
    },
}

/// POST /api/v1/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let prompt = req.prompt.as_deref().map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        return Err(AppError::Validation("prompt is required".to_string()));
    }

    if let Some(providers) = req.providers {
        let providers: Vec<String> = providers
            .into_iter()
            .filter_map(|p| p.as_str().map(str::to_string))
            .collect();

        if providers.is_empty() {
            return Ok(Json(GenerateResponse::FanOut {
                mode: GenerateMode::Degraded,
                message: Some(DEGRADED_MESSAGE),
                results: BTreeMap::new(),
            }));
        }

        info!("Fan-out generation to {:?}", providers);
        let results = state.inference.generate_all(&providers, prompt).await;
        return Ok(Json(GenerateResponse::FanOut {
            mode: GenerateMode::Ok,
            message: None,
            results,
        }));
    }

    let model = req
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MODEL)
        .to_string();

    let Some(llm) = state.llm.as_ref() else {
        return Ok(Json(GenerateResponse::Single {
            mode: GenerateMode::Mock,
            model,
            output: mock_generate(prompt),
        }));
    };

    let output = llm.generate_text(prompt, &model).await?;
    Ok(Json(GenerateResponse::Single {
        mode: GenerateMode::Openai,
        model,
        output,
    }))
}

fn mock_generate(prompt: &str) -> String {
    [
        "[MOCK LLM RESPONSE]".to_string(),
        String::new(),
        "Ваш промпт принят. Ниже пример структурированного ответа:".to_string(),
        "1) Краткое резюме".to_string(),
        "2) Ключевые тезисы".to_string(),
        "3) Рекомендованные следующие шаги".to_string(),
        String::new(),
        format!("Исходный prompt (фрагмент): {}", truncate_chars(prompt, 200)),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_generate_quotes_prompt_fragment() {
        let out = mock_generate("Действуй как аналитик");
        assert!(out.starts_with("[MOCK LLM RESPONSE]\n\n"));
        assert!(out.ends_with("Исходный prompt (фрагмент): Действуй как аналитик"));
    }

    #[test]
    fn test_degraded_response_shape() {
        let body = serde_json::to_value(GenerateResponse::FanOut {
            mode: GenerateMode::Degraded,
            message: Some(DEGRADED_MESSAGE),
            results: BTreeMap::new(),
        })
        .unwrap();
        assert_eq!(body["mode"], "degraded");
        assert_eq!(body["results"], serde_json::json!({}));
    }

    #[test]
    fn test_request_accepts_mixed_provider_list() {
        let req: GenerateRequest =
            serde_json::from_value(serde_json::json!({"providers": ["openai", 3], "prompt": "p"}))
                .unwrap();
        assert_eq!(req.providers.unwrap().len(), 2);
    }
}
