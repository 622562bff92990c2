//! OpenAI-compatible chat provider.
//!
//! One client covers every provider speaking the `chat/completions`
//! dialect; DeepSeek is the same wire format behind a different base
//! URL and key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ai::credentials::SecretString;
use crate::error::{ModelError, ModelResult};
use crate::traits::model::{ChatModel, StructuredRequest};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Chat model served over an OpenAI-compatible HTTP API.
pub struct OpenAiModel {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    provider: &'static str,
}

impl OpenAiModel {
    /// OpenAI-hosted model.
    pub fn openai(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            provider: "openai",
        }
    }

    /// DeepSeek-hosted model (OpenAI-compatible API).
    pub fn deepseek(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: DEEPSEEK_BASE_URL.to_string(),
            provider: "deepseek",
        }
    }

    /// Set a custom base URL (Azure, proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn transport_error(&self, e: reqwest::Error) -> ModelError {
        warn!(provider = self.provider, error = %e, "model transport failure");
        ModelError::Unavailable {
            provider: self.provider.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiModel {
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> ModelResult<serde_json::Value> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "job_extraction",
                    strict: true,
                    schema: &request.schema,
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                provider: self.provider.to_string(),
                message: error_text,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".to_string()))?;

        serde_json::from_str(&content).map_err(|e| ModelError::InvalidResponse(e.to_string()))
    }

    fn provider_name(&self) -> &str {
        self.provider
    }
}

// Request/Response types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: String,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'static str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_get_their_own_endpoints() {
        let openai = OpenAiModel::openai(SecretString::new("sk-test"), "gpt-4o");
        assert_eq!(openai.provider_name(), "openai");
        assert!(openai.base_url.contains("openai.com"));

        let deepseek = OpenAiModel::deepseek(SecretString::new("sk-test"), "deepseek-chat");
        assert_eq!(deepseek.provider_name(), "deepseek");
        assert!(deepseek.base_url.contains("deepseek.com"));
    }

    #[test]
    fn base_url_is_overridable() {
        let model = OpenAiModel::openai(SecretString::new("sk-test"), "gpt-4o")
            .with_base_url("http://127.0.0.1:9999/v1");
        assert_eq!(model.base_url, "http://127.0.0.1:9999/v1");
    }
}
