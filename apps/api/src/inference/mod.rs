//! Inference fan-out: sends one prompt to several providers at once.
//!
//! Default providers are mocks with fixed latency. When an OpenAI key is
//! configured, `openai` is backed by the real Responses API client instead.
//!
//! `AppState` holds an `Arc<InferenceRouter>`; providers plug in through the
//! `InferenceProvider` trait.

pub mod handlers;
pub mod providers;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::llm_client::{LlmClient, LlmError};
pub use providers::{MockProvider, OpenAiProvider};

// ────────────────────────────────────────────────────────────────────────────
// Result model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Ok,
    Error,
    Pending,
}

/// Outcome of one provider call.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
    pub status: ProviderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
}

impl ProviderResult {
    fn ok(output: String, model: &str, time_ms: u64) -> Self {
        Self {
            status: ProviderStatus::Ok,
            output: Some(output),
            error: None,
            model: Some(model.to_string()),
            time_ms: Some(time_ms),
        }
    }

    fn error(error: &InferenceError, model: &str, time_ms: u64) -> Self {
        Self {
            status: ProviderStatus::Error,
            output: None,
            error: Some(error.to_string()),
            model: Some(model.to_string()),
            time_ms: Some(time_ms),
        }
    }
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Unknown provider \"{0}\"")]
    UnknownProvider(String),

    #[error("{0}")]
    Simulated(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// A model backend addressable by id.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    fn id(&self) -> &str;
    fn model(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Router
// ────────────────────────────────────────────────────────────────────────────

pub struct InferenceRouter {
    providers: Vec<Arc<dyn InferenceProvider>>,
    timeout: Duration,
}

impl InferenceRouter {
    pub fn new(providers: Vec<Arc<dyn InferenceProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Built-in providers: `openai`, `claude` and `local`. `openai` uses the
    /// real client when one is given.
    pub fn with_defaults(llm: Option<LlmClient>, timeout: Duration) -> Self {
        let openai: Arc<dyn InferenceProvider> = match llm {
            Some(client) => Arc::new(OpenAiProvider::new(client)),
            None => Arc::new(MockProvider::openai()),
        };
        Self::new(
            vec![
                openai,
                Arc::new(MockProvider::claude()),
                Arc::new(MockProvider::local()),
            ],
            timeout,
        )
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    fn provider(&self, id: &str) -> Option<&Arc<dyn InferenceProvider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Runs every requested provider concurrently. Each call is timed and
    /// bounded independently; a failing provider only affects its own entry.
    /// Repeated ids are called once.
    pub async fn generate_all(
        &self,
        provider_ids: &[String],
        prompt: &str,
    ) -> BTreeMap<String, ProviderResult> {
        let mut ids: Vec<&str> = Vec::new();
        for id in provider_ids {
            if !ids.contains(&id.as_str()) {
                ids.push(id.as_str());
            }
        }

        let calls = ids.into_iter().map(|id| async move {
            let result = match self.provider(id) {
                Some(provider) => self.run(provider.as_ref(), prompt).await,
                None => {
                    warn!("Inference requested for unknown provider '{id}'");
                    ProviderResult::error(
                        &InferenceError::UnknownProvider(id.to_string()),
                        "unknown",
                        0,
                    )
                }
            };
            (id.to_string(), result)
        });

        join_all(calls).await.into_iter().collect()
    }

    async fn run(&self, provider: &dyn InferenceProvider, prompt: &str) -> ProviderResult {
        let started = Instant::now();
        let outcome = timeout(self.timeout, provider.generate(prompt)).await;
        let elapsed = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(Ok(output)) => ProviderResult::ok(output, provider.model(), elapsed),
            Ok(Err(e)) => ProviderResult::error(&e, provider.model(), elapsed),
            Err(_) => ProviderResult::error(
                &InferenceError::Timeout(self.timeout.as_millis() as u64),
                provider.model(),
                elapsed,
            ),
        };
        debug!(
            "Provider '{}' finished with {:?} in {}ms",
            provider.id(),
            result.status,
            elapsed
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hanging;

    #[async_trait]
    impl InferenceProvider for Hanging {
        fn id(&self) -> &str {
            "hanging"
        }
        fn model(&self) -> &str {
            "never"
        }
        async fn generate(&self, _prompt: &str) -> Result<String, InferenceError> {
            std::future::pending().await
        }
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn router() -> InferenceRouter {
        InferenceRouter::new(
            vec![
                Arc::new(MockProvider::openai()),
                Arc::new(MockProvider::claude()),
                Arc::new(MockProvider::local().with_failure_rate(1.0)),
                Arc::new(Hanging),
            ],
            Duration::from_secs(5),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_providers_run_concurrently() {
        let router = router();
        let started = Instant::now();
        let results = router
            .generate_all(&ids(&["openai", "claude"]), "Действуй как аналитик")
            .await;

        // Latencies overlap: total is the slowest provider, not the sum.
        assert!(started.elapsed() < Duration::from_millis(1800));
        assert_eq!(results["openai"].status, ProviderStatus::Ok);
        assert_eq!(results["openai"].model.as_deref(), Some("gpt-4o"));
        let openai_ms = results["openai"].time_ms.unwrap();
        let claude_ms = results["claude"].time_ms.unwrap();
        assert!((700..710).contains(&openai_ms), "{openai_ms}");
        assert!((1100..1110).contains(&claude_ms), "{claude_ms}");
        assert!(results["claude"]
            .output
            .as_deref()
            .unwrap()
            .contains("Действуй как аналитик"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_isolated() {
        let results = router()
            .generate_all(&ids(&["local", "openai"]), "prompt")
            .await;
        assert_eq!(results["local"].status, ProviderStatus::Error);
        assert_eq!(
            results["local"].error.as_deref(),
            Some("Local model crashed / OOM (simulated)")
        );
        assert_eq!(results["openai"].status, ProviderStatus::Ok);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_provider_yields_error_entry() {
        let results = router().generate_all(&ids(&["mystery"]), "prompt").await;
        let entry = &results["mystery"];
        assert_eq!(entry.status, ProviderStatus::Error);
        assert_eq!(entry.model.as_deref(), Some("unknown"));
        assert_eq!(entry.time_ms, Some(0));
        assert_eq!(entry.error.as_deref(), Some("Unknown provider \"mystery\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out_alone() {
        let results = router()
            .generate_all(&ids(&["hanging", "openai"]), "prompt")
            .await;
        assert_eq!(results["hanging"].status, ProviderStatus::Error);
        assert_eq!(results["hanging"].error.as_deref(), Some("Timed out after 5000 ms"));
        assert_eq!(results["openai"].status, ProviderStatus::Ok);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_ids_collapse() {
        let results = router()
            .generate_all(&ids(&["openai", "openai"]), "prompt")
            .await;
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_result_serializes_camel_case_without_nulls() {
        let value = serde_json::to_value(ProviderResult::ok("x".into(), "gpt-4o", 12)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "ok", "output": "x", "model": "gpt-4o", "timeMs": 12})
        );
    }

    #[test]
    fn test_default_provider_ids() {
        let router = InferenceRouter::with_defaults(None, Duration::from_secs(1));
        assert_eq!(router.provider_ids(), vec!["openai", "claude", "local"]);
    }
}
