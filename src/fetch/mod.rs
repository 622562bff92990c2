//! Page fetching: a fast HTTP path and a slow headless-browser path.

mod render;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedPage, PageFetcher};

/// Timeout for the standard fetch path.
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Descriptive User-Agent sent on the standard path.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; JobExtract/1.0; +https://github.com/jobextract)";

/// Desktop-browser User-Agent used by the rendered path, where the
/// point is to look like a real client.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Production [`PageFetcher`]: `reqwest` for the standard path,
/// headless Chromium for the rendered path.
pub struct WebFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for WebFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WebFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Set a custom user agent for the standard path.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

/// Classify an HTTP status into the fetch outcome taxonomy.
///
/// 403 and 429 are soft-blocks: the fetch technically succeeded but
/// the origin refused service to an automated client.
fn classify_status(status: u16) -> FetchResult<()> {
    match status {
        200..=299 => Ok(()),
        403 | 429 => Err(FetchError::SoftBlocked { status }),
        _ => Err(FetchError::HttpError { status }),
    }
}

fn classify_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        // DNS failures, refused connections, resets: no HTTP response
        // was ever received.
        FetchError::NetworkUnreachable(e.to_string())
    }
}

#[async_trait]
impl PageFetcher for WebFetcher {
    async fn fetch_standard(&self, url: &str) -> FetchResult<FetchedPage> {
        debug!(url = %url, "standard fetch starting");

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", ACCEPT)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "standard fetch failed");
                classify_transport_error(e)
            })?;

        let status = response.status().as_u16();
        classify_status(status)?;

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        debug!(url = %url, status, bytes = html.len(), "standard fetch completed");
        Ok(FetchedPage::new(html, status))
    }

    async fn fetch_rendered(&self, url: &str) -> FetchResult<String> {
        render::fetch_rendered(url, BROWSER_USER_AGENT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_pass() {
        assert!(classify_status(200).is_ok());
        assert!(classify_status(204).is_ok());
    }

    #[test]
    fn bot_refusals_are_soft_blocks() {
        assert!(matches!(
            classify_status(403),
            Err(FetchError::SoftBlocked { status: 403 })
        ));
        assert!(matches!(
            classify_status(429),
            Err(FetchError::SoftBlocked { status: 429 })
        ));
    }

    #[test]
    fn other_failures_are_page_level_errors() {
        assert!(matches!(
            classify_status(404),
            Err(FetchError::HttpError { status: 404 })
        ));
        assert!(matches!(
            classify_status(500),
            Err(FetchError::HttpError { status: 500 })
        ));
        // Redirects are expected to be followed by the client; one
        // surfacing here is a fetch failure, not a success.
        assert!(matches!(
            classify_status(301),
            Err(FetchError::HttpError { status: 301 })
        ));
    }
}
