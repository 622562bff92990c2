//! Model providers and the extraction invoker.

pub mod credentials;
pub mod invoker;
pub mod ollama;
pub mod openai;
pub mod prompts;

pub use credentials::SecretString;
pub use invoker::JobExtractor;
pub use ollama::{OllamaModel, DEFAULT_OLLAMA_BASE_URL};
pub use openai::OpenAiModel;

use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::traits::model::{ChatModel, ModelRegistry};
use crate::types::config::{ModelSelection, Provider};

/// Provider registry: resolves a caller's model selection to a usable
/// model handle using the keys and addresses this process was
/// configured with.
pub struct Providers {
    openai_api_key: Option<SecretString>,
    deepseek_api_key: Option<SecretString>,
    ollama_base_url: String,
}

impl Default for Providers {
    fn default() -> Self {
        Self::new()
    }
}

impl Providers {
    /// Registry with no remote keys and the default local daemon
    /// address.
    pub fn new() -> Self {
        Self {
            openai_api_key: None,
            deepseek_api_key: None,
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
        }
    }

    /// Read keys and addresses from the environment:
    /// `OPENAI_API_KEY`, `DEEPSEEK_API_KEY`, `OLLAMA_BASE_URL`.
    pub fn from_env() -> Self {
        let mut providers = Self::new();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            providers.openai_api_key = Some(SecretString::new(key));
        }
        if let Ok(key) = std::env::var("DEEPSEEK_API_KEY") {
            providers.deepseek_api_key = Some(SecretString::new(key));
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            providers.ollama_base_url = url;
        }
        providers
    }

    /// Set the OpenAI API key.
    pub fn with_openai_key(mut self, key: SecretString) -> Self {
        self.openai_api_key = Some(key);
        self
    }

    /// Set the DeepSeek API key.
    pub fn with_deepseek_key(mut self, key: SecretString) -> Self {
        self.deepseek_api_key = Some(key);
        self
    }

    /// Point at a non-default Ollama daemon.
    pub fn with_ollama_base_url(mut self, url: impl Into<String>) -> Self {
        self.ollama_base_url = url.into();
        self
    }
}

impl ModelRegistry for Providers {
    fn get_model(&self, selection: &ModelSelection) -> ModelResult<Arc<dyn ChatModel>> {
        match selection.provider {
            Provider::OpenAi => {
                let key = self
                    .openai_api_key
                    .clone()
                    .ok_or_else(|| ModelError::Config("OPENAI_API_KEY not set".to_string()))?;
                Ok(Arc::new(OpenAiModel::openai(key, selection.model_name())))
            }
            Provider::DeepSeek => {
                let key = self
                    .deepseek_api_key
                    .clone()
                    .ok_or_else(|| ModelError::Config("DEEPSEEK_API_KEY not set".to_string()))?;
                Ok(Arc::new(OpenAiModel::deepseek(key, selection.model_name())))
            }
            Provider::Ollama => Ok(Arc::new(
                OllamaModel::new(selection.model_name())
                    .with_base_url(self.ollama_base_url.clone())
                    .with_num_ctx(selection.context_window()),
            )),
        }
    }
}
