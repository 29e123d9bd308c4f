use crate::error::ScrapeError;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A single browser page that sites are visited through, one after another.
///
/// Selector matching on the cards happens over the rendered HTML returned by
/// [`PageDriver::content`], so an implementation only has to drive the browser.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Set the User-Agent for subsequent requests. Best effort: returns
    /// `false` when the browser refused it.
    async fn set_user_agent(&self, user_agent: &str) -> bool;

    /// Navigate to `url` and wait until the page has loaded.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Wait until `selector` matches something on the page.
    /// Returns `false` if it never appeared within `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool;

    /// Rendered HTML of the current page
    async fn content(&self) -> Result<String, ScrapeError>;
}

/// Opens the browser session used for a whole run.
///
/// The returned page owns the session; dropping it releases the browser.
pub trait BrowserLauncher {
    type Page: PageDriver;

    fn launch(&self, headless: bool) -> Result<Self::Page>;
}
