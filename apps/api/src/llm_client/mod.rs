//! LLM client: the single point of entry for calls to the OpenAI Responses API.
//!
//! No other module talks to a model provider over HTTP. The inference
//! fan-out and the single-model generate endpoint both go through here.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/responses";
/// Model used when the caller does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    /// Convenience aggregate some API versions include.
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// The generated text: `output_text` when present, otherwise every
    /// `output_text` part of every message item, concatenated.
    pub fn text(&self) -> Option<String> {
        if let Some(text) = self.output_text.as_deref().filter(|t| !t.is_empty()) {
            return Some(text.to_string());
        }
        let joined: String = self
            .output
            .iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.part_type == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!joined.is_empty()).then_some(joined)
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// Wraps the Responses API with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    backoff_base: Duration,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            api_url: OPENAI_API_URL.to_string(),
            backoff_base: Duration::from_secs(1),
        })
    }

    /// Points the client at another Responses-compatible endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[cfg(test)]
    fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Sends `prompt` to `model`, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, model: &str) -> Result<LlmResponse, LlmError> {
        let request_body = ResponsesRequest {
            model,
            input: prompt,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1x, 2x, 4x the base delay
                let delay = self.backoff_base * (1 << (attempt - 1));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<OpenAiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.text().await?;
            let llm_response: LlmResponse = serde_json::from_str(&body)?;

            if let Some(usage) = &llm_response.usage {
                debug!(
                    "LLM call succeeded: input_tokens={}, output_tokens={}",
                    usage.input_tokens, usage.output_tokens
                );
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the model and returns just the generated text.
    pub async fn generate_text(&self, prompt: &str, model: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, model).await?;
        response.text().ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn test_text_prefers_output_text() {
        let response: LlmResponse = serde_json::from_value(json!({
            "output_text": "готово",
            "output": [{"type": "message", "content": [{"type": "output_text", "text": "другое"}]}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("готово"));
    }

    #[test]
    fn test_text_collects_message_parts() {
        let response: LlmResponse = serde_json::from_value(json!({
            "output": [
                {"type": "reasoning", "content": [{"type": "output_text", "text": "skip"}]},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Часть 1. "},
                    {"type": "refusal"},
                    {"type": "output_text", "text": "Часть 2."}
                ]}
            ]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Часть 1. Часть 2."));
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let response: LlmResponse = serde_json::from_value(json!({"output": []})).unwrap();
        assert!(response.text().is_none());
    }

    /// Serves a Responses-like endpoint that fails `failures` times with 503.
    async fn spawn_stub(failures: u32) -> (String, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let app = Router::new()
            .route(
                "/v1/responses",
                post(
                    |State((calls, failures)): State<(Arc<AtomicU32>, u32)>,
                     Json(body): Json<Value>| async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        if n < failures {
                            return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})));
                        }
                        let input = body["input"].as_str().unwrap_or_default().to_string();
                        (StatusCode::OK, Json(json!({ "output_text": format!("echo: {input}") })))
                    },
                ),
            )
            .with_state((calls.clone(), failures));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1/responses"), calls)
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let (url, calls) = spawn_stub(2).await;
        let client = LlmClient::new("key".into())
            .unwrap()
            .with_api_url(url)
            .with_backoff_base(Duration::from_millis(1));

        let text = client.generate_text("привет", DEFAULT_MODEL).await.unwrap();
        assert_eq!(text, "echo: привет");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (url, calls) = spawn_stub(10).await;
        let client = LlmClient::new("key".into())
            .unwrap()
            .with_api_url(url)
            .with_backoff_base(Duration::from_millis(1));

        let err = client.call("x", DEFAULT_MODEL).await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 503, .. }), "{err}");
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES);
    }
}
