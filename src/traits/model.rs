//! ChatModel and ModelRegistry traits: the seam to LLM providers.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ModelResult;
use crate::types::config::ModelSelection;

/// A structured-output generation request.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    /// System prompt.
    pub system: String,
    /// User prompt embedding the content to extract from.
    pub prompt: String,
    /// JSON schema the output must conform to.
    pub schema: serde_json::Value,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A model handle that can produce schema-constrained JSON.
///
/// Implementations wrap specific providers and handle the transport
/// specifics; transport-level failures must surface as
/// [`crate::error::ModelError::Unavailable`] so callers can tell a
/// broken service from a bad request.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a JSON object conforming to the request's schema.
    async fn generate_structured(&self, request: &StructuredRequest)
        -> ModelResult<serde_json::Value>;

    /// Provider name for logs and error attribution.
    fn provider_name(&self) -> &str;
}

/// Resolves a caller's model selection to a usable model handle.
pub trait ModelRegistry: Send + Sync {
    /// Get a model handle for the selection, or a
    /// [`crate::error::ModelError::Config`] error if the provider is
    /// not usable (e.g. missing API key).
    fn get_model(&self, selection: &ModelSelection) -> ModelResult<Arc<dyn ChatModel>>;
}
