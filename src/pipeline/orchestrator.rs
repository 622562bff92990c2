//! The `JobPipeline` orchestrator.
//!
//! Three entry modes — extract from URL, extract from pasted text,
//! reprocess stored content — share one common tail: create a tracking
//! run, gate on minimum content, truncate to the model budget, invoke
//! the model, record the outcome. Fetch policy (including the single
//! standard→rendered fallback) resolves before the tail begins.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::ai::JobExtractor;
use crate::clean::{clean, looks_corrupted, metadata};
use crate::error::{ContentOrigin, FetchError, ModelError, PipelineError, Result};
use crate::traits::fetcher::PageFetcher;
use crate::traits::model::ModelRegistry;
use crate::traits::store::RunStore;
use crate::tracker::RunTracker;
use crate::types::config::{
    CleaningMethod, FetchMethod, ModelSelection, PipelineConfig, PipelineSettings,
};
use crate::types::job::ExtractedJob;
use crate::types::run::NewRun;

/// Absolute minimum cleaned-text length. Below this the run fails
/// regardless of how the content was obtained.
const MIN_CONTENT_CHARS: usize = 100;

/// Meaningful-content threshold for fetched pages. Standard-fetch text
/// below this triggers the rendered fallback (or a terminal error when
/// fallback is disabled); a page this thin usually means client-side
/// rendering.
const MEANINGFUL_CONTENT_CHARS: usize = 500;

/// Sequences fetch → clean → truncate → extract → track for one
/// request.
///
/// Each call is one independent task; the only shared state is the
/// external services behind the type parameters. Authentication and
/// rate limiting are the caller's gate: by the time a pipeline method
/// runs, the request is assumed authorized.
pub struct JobPipeline<F, P, S> {
    fetcher: F,
    providers: P,
    tracker: RunTracker<S>,
    extractor: JobExtractor,
    min_content_chars: usize,
    meaningful_content_chars: usize,
}

/// Inputs to the common tail, after fetch policy has resolved.
struct RunInput {
    raw_content: String,
    cleaned: String,
    source_url: Option<String>,
    job_id: Option<Uuid>,
    origin: ContentOrigin,
    gate_message: &'static str,
}

impl<F, P, S> JobPipeline<F, P, S>
where
    F: PageFetcher,
    P: ModelRegistry,
    S: RunStore + 'static,
{
    pub fn new(fetcher: F, providers: P, store: Arc<S>) -> Self {
        Self {
            fetcher,
            providers,
            tracker: RunTracker::new(store),
            extractor: JobExtractor::new(),
            min_content_chars: MIN_CONTENT_CHARS,
            meaningful_content_chars: MEANINGFUL_CONTENT_CHARS,
        }
    }

    /// Replace the extraction invoker (e.g. a custom system prompt).
    pub fn with_extractor(mut self, extractor: JobExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Tune the content gates. The defaults are heuristics, not
    /// structural invariants.
    pub fn with_thresholds(mut self, min_content: usize, meaningful_content: usize) -> Self {
        self.min_content_chars = min_content;
        self.meaningful_content_chars = meaningful_content;
        self
    }

    // =========================================================================
    // Entry modes
    // =========================================================================

    /// Extract structured job data from a job-posting URL.
    pub async fn extract_from_url(
        &self,
        url: &str,
        selection: &ModelSelection,
        settings: &PipelineSettings,
    ) -> Result<ExtractedJob> {
        if url.trim().is_empty() {
            return Err(PipelineError::BadRequest(
                "a URL or pasted content is required".to_string(),
            ));
        }
        let parsed = Url::parse(url)
            .map_err(|_| PipelineError::BadRequest("invalid URL format".to_string()))?;

        info!(
            url = %parsed,
            fetch_method = ?settings.fetch_method,
            cleaner = ?settings.cleaning_method,
            provider = %selection.provider,
            "extracting from URL"
        );

        let config = PipelineConfig::for_request(settings.cleaning_method, selection);
        let (raw_content, cleaned) = self.fetch_and_clean(&parsed, settings).await?;

        self.run_extraction(
            RunInput {
                raw_content,
                cleaned,
                source_url: Some(parsed.to_string()),
                job_id: None,
                origin: ContentOrigin::Fetched,
                gate_message: "could not extract enough text from this page; the site may require JavaScript or login",
            },
            &config,
            selection,
        )
        .await
    }

    /// Extract structured job data from pasted text.
    ///
    /// Pasted content is assumed to be already-extracted text, not a
    /// full page, so it is always cleaned with the html-strip method;
    /// main-content heuristics are unsuitable for fragment input.
    pub async fn extract_from_text(
        &self,
        text: &str,
        selection: &ModelSelection,
    ) -> Result<ExtractedJob> {
        if text.trim().is_empty() {
            return Err(PipelineError::BadRequest(
                "a URL or pasted content is required".to_string(),
            ));
        }

        info!(
            chars = text.chars().count(),
            provider = %selection.provider,
            "extracting from pasted text"
        );

        let config = PipelineConfig::for_request(CleaningMethod::HtmlStrip, selection);
        let cleaned = clean(text, CleaningMethod::HtmlStrip, None);

        self.run_extraction(
            RunInput {
                raw_content: text.to_string(),
                cleaned,
                source_url: None,
                job_id: None,
                origin: ContentOrigin::Pasted,
                gate_message: "not enough text to extract job details; please paste more of the job posting",
            },
            &config,
            selection,
        )
        .await
    }

    /// Re-run cleaning and extraction over a job's stored raw content.
    ///
    /// Never fetches: this is how a user changes pipeline settings
    /// after the fact and re-derives structured data. A new run is
    /// created; the prior run is never rewritten.
    pub async fn reprocess_job(
        &self,
        job_id: Uuid,
        selection: &ModelSelection,
        settings: &PipelineSettings,
    ) -> Result<ExtractedJob> {
        let latest = self
            .tracker
            .store()
            .find_latest_run_for_job(job_id)
            .await
            .map_err(|e| PipelineError::Storage(e.to_string()))?;

        let latest = match latest {
            Some(run) if !run.raw_content.trim().is_empty() => run,
            _ => return Err(PipelineError::ReprocessNotFound),
        };

        info!(
            %job_id,
            prior_run = %latest.id,
            cleaner = ?settings.cleaning_method,
            "reprocessing stored content"
        );

        let config = PipelineConfig::for_request(settings.cleaning_method, selection);
        let base_url = latest
            .source_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok());
        let cleaned = clean(
            &latest.raw_content,
            settings.cleaning_method,
            base_url.as_ref(),
        );

        self.run_extraction(
            RunInput {
                raw_content: latest.raw_content,
                cleaned,
                source_url: latest.source_url,
                job_id: Some(job_id),
                origin: ContentOrigin::Fetched,
                gate_message: "re-processing produced insufficient text content",
            },
            &config,
            selection,
        )
        .await
    }

    // =========================================================================
    // Cancellation wrappers
    // =========================================================================

    /// [`Self::extract_from_url`] that aborts when the caller's token
    /// fires (e.g. the HTTP request was dropped).
    pub async fn extract_from_url_with_cancel(
        &self,
        url: &str,
        selection: &ModelSelection,
        settings: &PipelineSettings,
        cancel: CancellationToken,
    ) -> Result<ExtractedJob> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = self.extract_from_url(url, selection, settings) => result,
        }
    }

    /// [`Self::extract_from_text`] with caller-scoped cancellation.
    pub async fn extract_from_text_with_cancel(
        &self,
        text: &str,
        selection: &ModelSelection,
        cancel: CancellationToken,
    ) -> Result<ExtractedJob> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = self.extract_from_text(text, selection) => result,
        }
    }

    /// [`Self::reprocess_job`] with caller-scoped cancellation.
    pub async fn reprocess_job_with_cancel(
        &self,
        job_id: Uuid,
        selection: &ModelSelection,
        settings: &PipelineSettings,
        cancel: CancellationToken,
    ) -> Result<ExtractedJob> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = self.reprocess_job(job_id, selection, settings) => result,
        }
    }

    // =========================================================================
    // Fetch policy
    // =========================================================================

    /// Resolve the fetch policy into final raw HTML and cleaned text.
    async fn fetch_and_clean(
        &self,
        url: &Url,
        settings: &PipelineSettings,
    ) -> Result<(String, String)> {
        let url_str = url.as_str();

        match settings.fetch_method {
            FetchMethod::AlwaysRendered => {
                let html = self
                    .fetcher
                    .fetch_rendered(url_str)
                    .await
                    .map_err(map_fetch_error)?;
                let cleaned = clean(&html, settings.cleaning_method, Some(url));
                Ok((html, cleaned))
            }

            FetchMethod::Standard => {
                let page = self
                    .fetcher
                    .fetch_standard(url_str)
                    .await
                    .map_err(map_fetch_error)?;
                let cleaned = clean(&page.html, settings.cleaning_method, Some(url));
                if cleaned.chars().count() < self.meaningful_content_chars {
                    return Err(PipelineError::InsufficientContent {
                        origin: ContentOrigin::Fetched,
                        message: "could not extract enough text from this page; the site may require JavaScript or login"
                            .to_string(),
                    });
                }
                Ok((page.html, cleaned))
            }

            FetchMethod::StandardWithFallback => {
                // A soft-block or thin content triggers exactly one
                // rendered retry; every other failure is terminal.
                let first_failure = match self.fetcher.fetch_standard(url_str).await {
                    Ok(page) => {
                        let cleaned = clean(&page.html, settings.cleaning_method, Some(url));
                        let chars = cleaned.chars().count();
                        if chars >= self.meaningful_content_chars {
                            return Ok((page.html, cleaned));
                        }
                        debug!(url = %url, chars, "standard fetch too thin, trying rendered");
                        format!("standard fetch produced only {chars} characters of text")
                    }
                    Err(FetchError::SoftBlocked { status }) => {
                        debug!(url = %url, status, "standard fetch soft-blocked, trying rendered");
                        format!("standard fetch was blocked (HTTP {status})")
                    }
                    Err(e) => return Err(map_fetch_error(e)),
                };

                let html = self.fetcher.fetch_rendered(url_str).await.map_err(|e| {
                    warn!(url = %url, error = %e, "rendered fallback failed");
                    PipelineError::RemoteFetchFailed(format!(
                        "{first_failure}; rendered fetch failed: {e}"
                    ))
                })?;

                let cleaned = clean(&html, settings.cleaning_method, Some(url));
                let chars = cleaned.chars().count();
                if chars < self.meaningful_content_chars {
                    return Err(PipelineError::InsufficientContent {
                        origin: ContentOrigin::Fetched,
                        message: format!(
                            "{first_failure}; rendered fetch produced only {chars} characters"
                        ),
                    });
                }
                Ok((html, cleaned))
            }
        }
    }

    // =========================================================================
    // Common tail
    // =========================================================================

    /// Track, gate, truncate, extract, record. Tracking writes never
    /// alter the result.
    async fn run_extraction(
        &self,
        input: RunInput,
        config: &PipelineConfig,
        selection: &ModelSelection,
    ) -> Result<ExtractedJob> {
        let mut params = NewRun::new(input.raw_content, config);
        if let Some(job_id) = input.job_id {
            params = params.for_job(job_id);
        }
        if let Some(source_url) = &input.source_url {
            params = params.with_source_url(source_url.clone());
        }
        let run_id = self.tracker.begin(params).await;

        let meta = metadata(&input.cleaned);
        debug!(
            chars = meta.character_count,
            words = meta.word_count,
            lines = meta.line_count,
            "cleaned content metrics"
        );

        if meta.character_count < self.min_content_chars {
            self.tracker
                .record_failed(run_id, "cleaned text too short", None);
            return Err(PipelineError::InsufficientContent {
                origin: input.origin,
                message: input.gate_message.to_string(),
            });
        }

        if looks_corrupted(&input.cleaned) {
            self.tracker
                .record_failed(run_id, "cleaned text appears corrupted", None);
            return Err(PipelineError::InsufficientContent {
                origin: input.origin,
                message: "the content appears to be corrupted rather than meaningful text"
                    .to_string(),
            });
        }

        let text = truncate_chars(&input.cleaned, config.max_input_chars);
        let cleaned_write = self.tracker.record_cleaned(run_id, &text);

        let model = match self.providers.get_model(selection) {
            Ok(model) => model,
            Err(e) => {
                let mapped = map_model_error(e, selection);
                self.tracker
                    .record_failed(run_id, &mapped.to_string(), cleaned_write);
                return Err(mapped);
            }
        };

        match self.extractor.extract(model.as_ref(), &text, config).await {
            Ok(job) => {
                info!(run_id = ?run_id, title = %job.title, "extraction succeeded");
                let data = serde_json::to_value(&job).unwrap_or(serde_json::Value::Null);
                self.tracker.record_extracted(run_id, &data, cleaned_write);
                Ok(job)
            }
            Err(e) => {
                let mapped = map_model_error(e, selection);
                warn!(run_id = ?run_id, error = %mapped, "extraction failed");
                self.tracker
                    .record_failed(run_id, &mapped.to_string(), cleaned_write);
                Err(mapped)
            }
        }
    }
}

/// Map fetch-stage errors into the caller-facing taxonomy.
fn map_fetch_error(e: FetchError) -> PipelineError {
    match e {
        FetchError::Timeout => PipelineError::Timeout,
        FetchError::NetworkUnreachable(cause) => PipelineError::NetworkUnreachable(cause),
        FetchError::SoftBlocked { status } => PipelineError::RemoteBlocked { status },
        FetchError::HttpError { status } => {
            PipelineError::RemoteFetchFailed(format!("HTTP {status}"))
        }
        FetchError::RenderFailure(cause) => PipelineError::RemoteFetchFailed(cause),
    }
}

/// Map model-stage errors into the caller-facing taxonomy, keeping the
/// service/request distinction.
fn map_model_error(e: ModelError, selection: &ModelSelection) -> PipelineError {
    match e {
        ModelError::Unavailable { provider, message } => {
            PipelineError::ProviderUnavailable { provider, message }
        }
        ModelError::Config(message) => PipelineError::ProviderUnavailable {
            provider: selection.provider.name().to_string(),
            message,
        },
        ModelError::Api { message, .. } => PipelineError::ExtractionFailed(message),
        ModelError::InvalidResponse(message) => PipelineError::ExtractionFailed(message),
    }
}

/// Truncate to at most `max_chars` characters, always on a char
/// boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
