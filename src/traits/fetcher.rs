//! PageFetcher trait: retrieving raw HTML for a URL.

use async_trait::async_trait;

use crate::error::FetchResult;

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Raw HTML body, exactly as returned by the origin.
    pub html: String,
    /// HTTP status the origin answered with.
    pub status: u16,
}

impl FetchedPage {
    pub fn new(html: impl Into<String>, status: u16) -> Self {
        Self {
            html: html.into(),
            status,
        }
    }
}

/// Retrieves raw HTML for a URL via a fast path and a slow,
/// higher-fidelity fallback.
///
/// Implementations must distinguish a soft-block (the origin answered
/// but refused service to an automated client) from other failures, so
/// the orchestrator can decide whether the rendered fallback is worth
/// trying.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fast path: plain HTTP GET with a bounded timeout.
    ///
    /// Returns `Ok` only for 2xx responses; 403/429 surface as
    /// [`crate::error::FetchError::SoftBlocked`], other non-2xx as
    /// [`crate::error::FetchError::HttpError`].
    async fn fetch_standard(&self, url: &str) -> FetchResult<FetchedPage>;

    /// Slow path: drive a headless browser, let client-side rendering
    /// settle, and capture the rendered DOM serialization.
    ///
    /// The browser instance is released on every exit path.
    async fn fetch_rendered(&self, url: &str) -> FetchResult<String>;
}
