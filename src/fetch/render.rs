//! Rendered fetch: headless Chromium for JS-heavy pages and some bot
//! protections that block a plain GET.
//!
//! The browser is a scoped resource: acquired per call, released on
//! every exit path. The navigation result is captured before teardown
//! so a failed render still closes the browser.

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};

/// Bound on navigation, matching the higher fidelity (and cost) of a
/// full browser load.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed settle delay after navigation so client-side rendering can
/// populate the DOM.
const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Fetch a page's fully rendered HTML with a headless browser.
///
/// Requires a Chromium binary on the host.
pub(crate) async fn fetch_rendered(url: &str, user_agent: &str) -> FetchResult<String> {
    debug!(url = %url, "rendered fetch starting");

    let config = BrowserConfig::builder()
        .build()
        .map_err(FetchError::RenderFailure)?;

    let (mut browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| FetchError::RenderFailure(format!("browser launch failed: {e}")))?;

    // The handler stream must be driven for the browser connection to
    // make progress.
    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let result = render_page(&browser, url, user_agent).await;

    if let Err(e) = browser.close().await {
        warn!(url = %url, error = %e, "browser close failed");
    }
    let _ = browser.wait().await;
    handler_task.abort();

    match &result {
        Ok(html) => debug!(url = %url, bytes = html.len(), "rendered fetch completed"),
        Err(e) => warn!(url = %url, error = %e, "rendered fetch failed"),
    }
    result
}

async fn render_page(browser: &Browser, url: &str, user_agent: &str) -> FetchResult<String> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| FetchError::RenderFailure(format!("page creation failed: {e}")))?;

    page.set_user_agent(user_agent)
        .await
        .map_err(|e| FetchError::RenderFailure(format!("user agent override failed: {e}")))?;

    timeout(NAVIGATION_TIMEOUT, page.goto(url))
        .await
        .map_err(|_| FetchError::RenderFailure("navigation timed out".to_string()))?
        .map_err(|e| FetchError::RenderFailure(format!("navigation failed: {e}")))?;

    // Let client-side rendering settle before capturing the DOM.
    sleep(SETTLE_DELAY).await;

    page.content()
        .await
        .map_err(|e| FetchError::RenderFailure(format!("content capture failed: {e}")))
}
