use crate::error::ScrapeError;
use crate::scrapers::traits::{BrowserLauncher, PageDriver};
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Launches headless Chrome for a scrape run
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeLauncher;

impl BrowserLauncher for ChromeLauncher {
    type Page = ChromePage;

    fn launch(&self, headless: bool) -> Result<ChromePage> {
        info!("Launching Chrome (headless: {})...", headless);

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;

        Ok(ChromePage { browser, tab })
    }
}

/// One Chrome tab plus the browser process behind it.
///
/// Dropping the page closes the tab and shuts the browser down, so the
/// session is released whether the run finished normally or bailed out.
pub struct ChromePage {
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    /// Run a blocking DevTools call off the async runtime and wait for it.
    async fn blocking<T, F>(&self, f: F) -> Result<T, ScrapeError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Tab>) -> T + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || f(tab))
            .await
            .map_err(|e| ScrapeError::Browser(format!("Browser task failed: {}", e)))
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn set_user_agent(&self, user_agent: &str) -> bool {
        let user_agent = user_agent.to_string();
        self.blocking(move |tab| tab.set_user_agent(&user_agent, None, None))
            .await
            .and_then(|result| result.map_err(|e| ScrapeError::Browser(e.to_string())))
            .inspect_err(|e| debug!("Could not set user agent: {}", e))
            .is_ok()
    }

    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        debug!("Navigating to {}", url);
        let target = url.to_string();
        let started = Instant::now();

        let result = self
            .blocking(move |tab| {
                tab.set_default_timeout(timeout);
                tab.navigate_to(&target)?;
                tab.wait_until_navigated()?;
                Ok::<(), anyhow::Error>(())
            })
            .await?;

        result.map_err(|e| {
            if started.elapsed() >= timeout {
                ScrapeError::Timeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                ScrapeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            let found = tab
                .wait_for_element_with_custom_timeout(&selector, timeout)
                .is_ok();
            found
        })
        .await
        .unwrap_or(false)
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        let html = self
            .blocking(|tab| {
                tab.evaluate("document.documentElement.outerHTML", false)
                    .map(|result| result.value)
            })
            .await?
            .map_err(|e| ScrapeError::Browser(format!("Failed to read page HTML: {}", e)))?;

        match html.as_ref().and_then(|value| value.as_str()) {
            Some(html) => Ok(html.to_string()),
            None => {
                warn!("Could not get HTML from page");
                Ok(String::new())
            }
        }
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            debug!("Tab was already gone on close: {}", e);
        }
        // the Chrome process is killed when `browser` drops
        debug!("Closing browser (pid {:?})", self.browser.get_process_id());
    }
}
