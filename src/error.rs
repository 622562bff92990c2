//! Typed errors for the extraction pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. `PipelineError` is the
//! caller-facing taxonomy; `FetchError`, `ModelError` and `StoreError`
//! are stage-level errors mapped at the orchestrator boundary.

use thiserror::Error;

/// Where the content under extraction came from. Drives user messaging
/// for thin-content failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOrigin {
    /// Content was fetched from a URL.
    Fetched,
    /// Content was pasted by the user.
    Pasted,
}

/// Caller-facing pipeline errors.
///
/// Every terminal branch of the pipeline returns one of these; raw
/// transport or parser errors never escape the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller-fixable input problem (missing URL/text, missing model,
    /// malformed URL). Never retried.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Origin returned 403/429 and no fallback succeeded (or fallback
    /// was disabled). The user should paste the posting manually.
    #[error("this site blocked the request (HTTP {status}); try pasting the job description manually")]
    RemoteBlocked { status: u16 },

    /// Origin returned another non-2xx status, or the rendered fetch
    /// threw. Not retried automatically.
    #[error("failed to fetch the page: {0}")]
    RemoteFetchFailed(String),

    /// Standard fetch exceeded its bound.
    #[error("request timed out; the site took too long to respond")]
    Timeout,

    /// DNS/connection-level failure before any HTTP response.
    #[error("could not reach the URL: {0}")]
    NetworkUnreachable(String),

    /// Cleaned text below a content gate after all fallback attempts.
    #[error("{message}")]
    InsufficientContent {
        origin: ContentOrigin,
        message: String,
    },

    /// No prior run, or prior run has no raw content, for the job.
    #[error("no previous pipeline data found for this job; cannot re-process")]
    ReprocessNotFound,

    /// Model transport-level failure: the service, not the request, is
    /// broken. Carries the provider name so the user knows which
    /// service to check.
    #[error("cannot connect to the {provider} service: {message}")]
    ProviderUnavailable { provider: String, message: String },

    /// Model call succeeded transport-wise but produced output failing
    /// schema validation, or threw an application error.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// Run-store lookup failed (reprocess only; tracking writes are
    /// swallowed, never surfaced).
    #[error("storage error: {0}")]
    Storage(String),

    /// Operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Illustrative HTTP status for this error, matching the severity
    /// mapping used by the HTTP surface that consumes this crate.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::RemoteBlocked { .. } => 422,
            Self::RemoteFetchFailed(_) => 422,
            Self::Timeout => 504,
            Self::NetworkUnreachable(_) => 502,
            Self::InsufficientContent { .. } => 422,
            Self::ReprocessNotFound => 404,
            Self::ProviderUnavailable { .. } => 503,
            Self::ExtractionFailed(_) => 500,
            Self::Storage(_) => 500,
            Self::Cancelled => 499,
        }
    }
}

/// Errors from the page-fetching stage.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The abort signal fired before a response arrived.
    #[error("fetch timed out")]
    Timeout,

    /// Connection-level failure (DNS, refused, reset) before any HTTP
    /// response.
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    /// The origin answered but refused service to an automated client.
    #[error("soft-blocked by origin (HTTP {status})")]
    SoftBlocked { status: u16 },

    /// Any other non-2xx response.
    #[error("HTTP {status}")]
    HttpError { status: u16 },

    /// The headless-browser path failed (launch, navigation, or DOM
    /// capture).
    #[error("rendered fetch failed: {0}")]
    RenderFailure(String),
}

/// Errors from the model-invocation stage.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Transport-level failure: connection refused, DNS failure,
    /// timeout. The provider service is unreachable.
    #[error("{provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },

    /// The provider answered with a non-success status or an API-level
    /// error payload.
    #[error("{provider} API error: {message}")]
    Api { provider: String, message: String },

    /// The model responded but the output did not match the expected
    /// schema.
    #[error("model output failed validation: {0}")]
    InvalidResponse(String),

    /// Provider registry misconfiguration (unknown provider, missing
    /// API key).
    #[error("provider configuration error: {0}")]
    Config(String),
}

/// Errors from the run-tracking store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure (connection, query, serialization).
    #[error("store backend error: {0}")]
    Backend(String),

    /// The requested status change violates the run state machine.
    #[error("invalid run transition: {0}")]
    InvalidTransition(String),

    /// No run with the given id.
    #[error("run not found: {0}")]
    RunNotFound(uuid::Uuid),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
