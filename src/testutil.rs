//! In-memory browser doubles shared by unit tests.

use crate::config::{Config, SiteConfig};
use crate::error::ScrapeError;
use crate::scrapers::traits::{BrowserLauncher, PageDriver};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Config with every wait set to zero so tests run instantly.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.scrape.settle_ms = 0;
    config.scrape.selector_timeout_ms = 0;
    config.throttle.min_sleep_ms = 0;
    config.throttle.max_sleep_ms = 0;
    config.retry.base_delay_ms = 0;
    config
}

/// Site using the selectors of the test fixtures.
pub fn listing_site(name: &str, url: &str) -> SiteConfig {
    SiteConfig {
        title_selector: Some("h2.title".to_string()),
        price_selector: Some("span.price".to_string()),
        details_selector: Some("p.details".to_string()),
        url_selector: Some("a.link".to_string()),
        ..SiteConfig::new(name, url, "div.card")
    }
}

#[derive(Default)]
struct FakeState {
    current: Option<String>,
    visits: Vec<String>,
    user_agents: Vec<String>,
    closed: bool,
}

/// Page that serves canned HTML per URL.
#[derive(Clone, Default)]
pub struct FakePage {
    pages: HashMap<String, String>,
    timing_out: HashSet<String>,
    reject_user_agent: bool,
    /// Set only on the page handed out by [`FakeLauncher::launch`]
    session: bool,
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Every navigation to `url` times out.
    pub fn timing_out(mut self, url: &str) -> Self {
        self.timing_out.insert(url.to_string());
        self
    }

    pub fn rejecting_user_agent(mut self) -> Self {
        self.reject_user_agent = true;
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.state.lock().unwrap().visits.clone()
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.state.lock().unwrap().user_agents.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn current_html(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .cloned()
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn set_user_agent(&self, user_agent: &str) -> bool {
        if self.reject_user_agent {
            return false;
        }
        self.state
            .lock()
            .unwrap()
            .user_agents
            .push(user_agent.to_string());
        true
    }

    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let mut state = self.state.lock().unwrap();
        state.visits.push(url.to_string());

        if self.timing_out.contains(url) {
            state.current = None;
            return Err(ScrapeError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        if !self.pages.contains_key(url) {
            state.current = None;
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }

        state.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> bool {
        let Some(html) = self.current_html() else {
            return false;
        };
        let Ok(selector) = Selector::parse(selector) else {
            return false;
        };
        let document = Html::parse_document(&html);
        let found = document.select(&selector).next().is_some();
        found
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        self.current_html()
            .ok_or_else(|| ScrapeError::Browser("no page loaded".to_string()))
    }
}

impl Drop for FakePage {
    fn drop(&mut self) {
        if !self.session {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
    }
}

/// Hands out clones of one [`FakePage`], or fails to launch.
pub struct FakeLauncher {
    page: Option<FakePage>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self { page: Some(page) }
    }

    pub fn broken() -> Self {
        Self { page: None }
    }
}

impl BrowserLauncher for FakeLauncher {
    type Page = FakePage;

    fn launch(&self, _headless: bool) -> anyhow::Result<FakePage> {
        self.page
            .clone()
            .map(|mut page| {
                page.session = true;
                page
            })
            .ok_or_else(|| anyhow::anyhow!("Failed to launch Chrome browser"))
    }
}
