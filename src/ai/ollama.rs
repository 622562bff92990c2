//! Ollama chat provider: a local, self-hosted model daemon.
//!
//! Unlike the remote providers, the daemon may simply not be running,
//! so every call is preceded by an explicit reachability probe that
//! turns "connection refused" into a clear provider-unavailable error
//! before any generation is attempted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ModelError, ModelResult};
use crate::traits::model::{ChatModel, StructuredRequest};

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";

/// Bound on the reachability probe; the daemon answers `/api/tags`
/// instantly when it is up at all.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const PROVIDER: &str = "ollama";

/// Chat model served by a local Ollama daemon.
pub struct OllamaModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    num_ctx: Option<u32>,
}

impl OllamaModel {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: model.into(),
            num_ctx: None,
        }
    }

    /// Point at a non-default daemon address.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the context window (passed as the `num_ctx` option).
    pub fn with_num_ctx(mut self, num_ctx: u32) -> Self {
        self.num_ctx = Some(num_ctx);
        self
    }

    fn unavailable(&self, message: impl Into<String>) -> ModelError {
        ModelError::Unavailable {
            provider: PROVIDER.to_string(),
            message: message.into(),
        }
    }

    /// Probe the daemon before generating, so an unreachable service
    /// is reported as such rather than as a failed extraction.
    async fn ensure_reachable(&self) -> ModelResult<()> {
        let result = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(self.unavailable(format!(
                "daemon responded with HTTP {}",
                response.status().as_u16()
            ))),
            Err(e) => {
                warn!(error = %e, "ollama reachability probe failed");
                Err(self.unavailable(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl ChatModel for OllamaModel {
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> ModelResult<serde_json::Value> {
        self.ensure_reachable().await?;

        let body = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![
                OllamaMessage {
                    role: "system",
                    content: &request.system,
                },
                OllamaMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            stream: false,
            format: &request.schema,
            options: OllamaOptions {
                temperature: request.temperature,
                num_ctx: self.num_ctx,
            },
        };

        debug!(model = %self.model, num_ctx = ?self.num_ctx, "ollama generation starting");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                provider: PROVIDER.to_string(),
                message: error_text,
            });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        serde_json::from_str(&chat_response.message.content)
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}

// Request/Response types

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: String,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    format: &'a serde_json::Value,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_configures_daemon_address_and_context() {
        let model = OllamaModel::new("llama3.2")
            .with_base_url("http://127.0.0.1:11435")
            .with_num_ctx(16_384);
        assert_eq!(model.base_url, "http://127.0.0.1:11435");
        assert_eq!(model.num_ctx, Some(16_384));
        assert_eq!(model.provider_name(), "ollama");
    }

    #[tokio::test]
    async fn unreachable_daemon_is_reported_as_unavailable() {
        // Nothing listens on this port.
        let model = OllamaModel::new("llama3.2").with_base_url("http://127.0.0.1:59999");
        let err = model.ensure_reachable().await.unwrap_err();
        assert!(matches!(err, ModelError::Unavailable { ref provider, .. } if provider == "ollama"));
    }
}
