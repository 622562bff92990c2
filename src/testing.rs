//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the pipeline
//! without making real network or LLM calls. All mocks share state
//! through `Arc`, so a clone kept by the test still observes calls
//! made through the clone handed to the pipeline.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{FetchError, FetchResult, ModelError, ModelResult};
use crate::traits::fetcher::{FetchedPage, PageFetcher};
use crate::traits::model::{ChatModel, ModelRegistry, StructuredRequest};
use crate::types::config::ModelSelection;
use crate::types::job::ExtractedJob;

/// A mock page fetcher with scripted responses and call counting.
///
/// Responses are consumed in order; when the script runs dry the
/// fetch fails with a distinctive network error, so a test that
/// over-fetches fails loudly instead of silently succeeding.
#[derive(Clone, Default)]
pub struct MockFetcher {
    standard_responses: Arc<Mutex<VecDeque<FetchResult<FetchedPage>>>>,
    rendered_responses: Arc<Mutex<VecDeque<FetchResult<String>>>>,
    standard_calls: Arc<AtomicUsize>,
    rendered_calls: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful standard fetch.
    pub fn with_standard_page(self, html: impl Into<String>, status: u16) -> Self {
        self.standard_responses
            .lock()
            .unwrap()
            .push_back(Ok(FetchedPage::new(html, status)));
        self
    }

    /// Script a failing standard fetch.
    pub fn with_standard_error(self, error: FetchError) -> Self {
        self.standard_responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Script a successful rendered fetch.
    pub fn with_rendered_html(self, html: impl Into<String>) -> Self {
        self.rendered_responses
            .lock()
            .unwrap()
            .push_back(Ok(html.into()));
        self
    }

    /// Script a failing rendered fetch.
    pub fn with_rendered_error(self, error: FetchError) -> Self {
        self.rendered_responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// How many standard fetches were attempted.
    pub fn standard_calls(&self) -> usize {
        self.standard_calls.load(Ordering::SeqCst)
    }

    /// How many rendered fetches were attempted.
    pub fn rendered_calls(&self) -> usize {
        self.rendered_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_standard(&self, _url: &str) -> FetchResult<FetchedPage> {
        self.standard_calls.fetch_add(1, Ordering::SeqCst);
        self.standard_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(FetchError::NetworkUnreachable(
                    "mock: no scripted standard response".to_string(),
                ))
            })
    }

    async fn fetch_rendered(&self, _url: &str) -> FetchResult<String> {
        self.rendered_calls.fetch_add(1, Ordering::SeqCst);
        self.rendered_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(FetchError::RenderFailure(
                    "mock: no scripted rendered response".to_string(),
                ))
            })
    }
}

/// A mock chat model with scripted structured outputs and request
/// recording.
#[derive(Clone, Default)]
pub struct MockChatModel {
    responses: Arc<Mutex<VecDeque<ModelResult<serde_json::Value>>>>,
    default_response: Arc<Mutex<Option<serde_json::Value>>>,
    requests: Arc<Mutex<Vec<StructuredRequest>>>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model that always returns this JSON value.
    pub fn returning_json(value: serde_json::Value) -> Self {
        let model = Self::new();
        *model.default_response.lock().unwrap() = Some(value);
        model
    }

    /// A model that always returns this job.
    pub fn returning_job(job: &ExtractedJob) -> Self {
        Self::returning_json(serde_json::to_value(job).expect("job serializes"))
    }

    /// Script a one-shot response ahead of the default.
    pub fn with_response(self, response: ModelResult<serde_json::Value>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// A model whose next call fails with the given error.
    pub fn failing_with(error: ModelError) -> Self {
        Self::new().with_response(Err(error))
    }

    /// All structured requests made to this mock.
    pub fn requests(&self) -> Vec<StructuredRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls made to this mock.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> ModelResult<serde_json::Value> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(scripted) = self.responses.lock().unwrap().pop_front() {
            return scripted;
        }
        if let Some(default) = self.default_response.lock().unwrap().clone() {
            return Ok(default);
        }
        Err(ModelError::Api {
            provider: "mock".to_string(),
            message: "no scripted response".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

/// A registry that hands out clones of one mock model.
#[derive(Clone)]
pub struct MockRegistry {
    model: MockChatModel,
}

impl MockRegistry {
    pub fn new(model: MockChatModel) -> Self {
        Self { model }
    }

    /// The shared model handle, for assertions.
    pub fn model(&self) -> &MockChatModel {
        &self.model
    }
}

impl ModelRegistry for MockRegistry {
    fn get_model(&self, _selection: &ModelSelection) -> ModelResult<Arc<dyn ChatModel>> {
        Ok(Arc::new(self.model.clone()))
    }
}

/// A canned job for tests that only care that extraction succeeded.
pub fn sample_job() -> ExtractedJob {
    ExtractedJob {
        title: "Senior Rust Engineer".to_string(),
        company: "Acme".to_string(),
        locations: vec!["Remote".to_string()],
        description: "<p>Builds extraction pipelines.</p>".to_string(),
        job_type: None,
        work_arrangement: None,
        salary_min: None,
        salary_max: None,
        responsibilities: None,
        minimum_qualifications: None,
        preferred_qualifications: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_responses_are_consumed_in_order() {
        let fetcher = MockFetcher::new()
            .with_standard_error(FetchError::SoftBlocked { status: 403 })
            .with_standard_page("<p>second</p>", 200);

        assert!(matches!(
            fetcher.fetch_standard("https://a").await,
            Err(FetchError::SoftBlocked { status: 403 })
        ));
        let page = fetcher.fetch_standard("https://a").await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(fetcher.standard_calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_script_fails_loudly() {
        let fetcher = MockFetcher::new();
        assert!(fetcher.fetch_standard("https://a").await.is_err());
        assert!(fetcher.fetch_rendered("https://a").await.is_err());
    }

    #[tokio::test]
    async fn clones_share_observations() {
        let model = MockChatModel::returning_json(serde_json::json!({"ok": true}));
        let handle = model.clone();

        let request = StructuredRequest {
            system: "s".into(),
            prompt: "p".into(),
            schema: serde_json::json!({}),
            temperature: 0.1,
        };
        model.generate_structured(&request).await.unwrap();

        assert_eq!(handle.call_count(), 1);
        assert_eq!(handle.requests()[0].prompt, "p");
    }
}
