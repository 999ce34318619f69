use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::inference::{InferenceError, InferenceProvider};
use crate::llm_client::LlmClient;

/// Canned provider with fixed latency and an optional simulated failure rate.
#[derive(Debug, Clone)]
pub struct MockProvider {
    id: &'static str,
    model: &'static str,
    label: &'static str,
    latency: Duration,
    /// Characters of the prompt echoed back in the answer.
    echo_chars: usize,
    failure_rate: f64,
    failure_message: &'static str,
}

impl MockProvider {
    pub fn openai() -> Self {
        Self {
            id: "openai",
            model: "gpt-4o",
            label: "OpenAI (gpt-4o)",
            latency: Duration::from_millis(700),
            echo_chars: 180,
            failure_rate: 0.0,
            failure_message: "",
        }
    }

    pub fn claude() -> Self {
        Self {
            id: "claude",
            model: "claude-3.5",
            label: "Anthropic Claude",
            latency: Duration::from_millis(1100),
            echo_chars: 200,
            failure_rate: 0.0,
            failure_message: "",
        }
    }

    pub fn local() -> Self {
        Self {
            id: "local",
            model: "local-llm",
            label: "Local LLM",
            latency: Duration::from_millis(1200),
            echo_chars: 160,
            failure_rate: 0.3,
            failure_message: "Local model crashed / OOM (simulated)",
        }
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate.clamp(0.0, 1.0);
        self
    }

    fn fails(&self) -> bool {
        self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate.min(1.0))
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    fn id(&self) -> &str {
        self.id
    }

    fn model(&self) -> &str {
        self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        tokio::time::sleep(self.latency).await;
        if self.fails() {
            return Err(InferenceError::Simulated(self.failure_message.to_string()));
        }
        Ok(format!(
            "{} — mock answer for prompt:\n{}",
            self.label,
            truncate_chars(prompt, self.echo_chars)
        ))
    }
}

/// `openai` backed by the Responses API.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: LlmClient,
    model: String,
}

impl OpenAiProvider {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            model: "gpt-4o".to_string(),
        }
    }
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    fn id(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        Ok(self.client.generate_text(prompt, &self.model).await?)
    }
}

/// First `max` characters of `text`, with an ellipsis when something was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
