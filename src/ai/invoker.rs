//! The extraction invoker: prompt assembly, model call, and strict
//! output validation.

use tracing::debug;

use crate::ai::prompts::{build_job_extract_prompt, JOB_EXTRACT_SYSTEM_PROMPT};
use crate::error::{ModelError, ModelResult};
use crate::traits::model::{ChatModel, StructuredRequest};
use crate::types::config::PipelineConfig;
use crate::types::job::ExtractedJob;

/// Builds the LLM request (system prompt + user prompt + output
/// schema), calls the model, and validates the result into an
/// [`ExtractedJob`].
pub struct JobExtractor {
    system_prompt: String,
}

impl Default for JobExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl JobExtractor {
    pub fn new() -> Self {
        Self {
            system_prompt: JOB_EXTRACT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Override the system prompt (e.g. a different extrapolation
    /// policy).
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Extract structured job data from cleaned text.
    ///
    /// Output that does not conform to the [`ExtractedJob`] schema —
    /// including unrecognized fields — is rejected as
    /// [`ModelError::InvalidResponse`], distinct from the
    /// transport-level [`ModelError::Unavailable`].
    pub async fn extract(
        &self,
        model: &dyn ChatModel,
        cleaned_text: &str,
        config: &PipelineConfig,
    ) -> ModelResult<ExtractedJob> {
        let request = StructuredRequest {
            system: self.system_prompt.clone(),
            prompt: build_job_extract_prompt(cleaned_text),
            schema: ExtractedJob::output_schema(),
            temperature: config.temperature,
        };

        debug!(
            provider = model.provider_name(),
            model = %config.model,
            input_chars = cleaned_text.chars().count(),
            "invoking extraction model"
        );

        let value = model.generate_structured(&request).await?;

        serde_json::from_value::<ExtractedJob>(value)
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChatModel;
    use crate::types::config::{CleaningMethod, ModelSelection, Provider};

    fn config() -> PipelineConfig {
        PipelineConfig::for_request(
            CleaningMethod::HtmlStrip,
            &ModelSelection::new(Provider::Ollama, "llama3.2"),
        )
    }

    #[tokio::test]
    async fn valid_output_deserializes() {
        let model = MockChatModel::returning_json(serde_json::json!({
            "title": "Rust Engineer",
            "company": "Acme",
            "locations": ["Remote"],
            "description": "<p>Systems work.</p>"
        }));

        let job = JobExtractor::new()
            .extract(&model, "cleaned posting text", &config())
            .await
            .unwrap();
        assert_eq!(job.title, "Rust Engineer");
        assert!(job.salary_min.is_none());
    }

    #[tokio::test]
    async fn unrecognized_shapes_are_rejected() {
        let model = MockChatModel::returning_json(serde_json::json!({
            "title": "Rust Engineer",
            "company": "Acme",
            "locations": ["Remote"],
            "description": "d",
            "hallucinatedField": true
        }));

        let err = JobExtractor::new()
            .extract(&model, "text", &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn request_carries_prompts_schema_and_temperature() {
        let model = MockChatModel::returning_json(serde_json::json!({
            "title": "t", "company": "c", "locations": [], "description": "d"
        }));

        JobExtractor::new()
            .extract(&model, "THE-CLEANED-TEXT", &config())
            .await
            .unwrap();

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert!(req.prompt.contains("THE-CLEANED-TEXT"));
        assert!(req.system.contains("job posting data extractor"));
        assert!((req.temperature - 0.1).abs() < f32::EPSILON);
        assert!(req.schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .any(|v| v == "title"));
    }
}
