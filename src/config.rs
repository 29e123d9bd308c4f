use anyhow::{bail, Context, Result};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Full run configuration, loaded once at startup and read-only afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,
    /// Defaults to `<output_folder>/properties.db`
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub scrape: ScrapeSettings,
    #[serde(default)]
    pub throttle: ThrottleSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub user_agents: Vec<String>,
    #[serde(default)]
    pub telegram: TelegramSettings,
}

/// One target site and the selectors used to pull listings out of it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    pub list_selector: String,
    #[serde(default)]
    pub title_selector: Option<String>,
    #[serde(default)]
    pub price_selector: Option<String>,
    #[serde(default)]
    pub details_selector: Option<String>,
    #[serde(default)]
    pub url_selector: Option<String>,
}

impl SiteConfig {
    #[cfg(test)]
    pub fn new(name: &str, url: &str, list_selector: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            list_selector: list_selector.to_string(),
            title_selector: None,
            price_selector: None,
            details_selector: None,
            url_selector: None,
        }
    }

    fn optional_selectors(&self) -> impl Iterator<Item = &String> {
        [
            &self.title_selector,
            &self.price_selector,
            &self.details_selector,
            &self.url_selector,
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeSettings {
    /// Navigation timeout in milliseconds
    pub timeout: u64,
    pub headless: bool,
    /// Pause after navigation so client-side rendering can finish
    pub settle_ms: u64,
    pub selector_timeout_ms: u64,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            timeout: 60_000,
            headless: true,
            settle_ms: 1_000,
            selector_timeout_ms: 15_000,
        }
    }
}

impl ScrapeSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleSettings {
    pub min_sleep_ms: u64,
    pub max_sleep_ms: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            min_sleep_ms: 800,
            max_sleep_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
        }
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub enabled: bool,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: String,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: None,
            chat_id: None,
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

/// Credentials after applying environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramCredentials {
    pub token: Option<String>,
    pub chat_id: Option<String>,
}

impl TelegramSettings {
    /// Resolve credentials: `TELEGRAM_TOKEN` / `TELEGRAM_CHAT_ID` win over configured values.
    pub fn credentials(&self) -> TelegramCredentials {
        self.credentials_with(|key| std::env::var(key).ok())
    }

    fn credentials_with(&self, lookup: impl Fn(&str) -> Option<String>) -> TelegramCredentials {
        let pick = |env_key: &str, configured: &Option<String>| {
            lookup(env_key)
                .filter(|v| !v.is_empty())
                .or_else(|| configured.clone().filter(|v| !v.is_empty()))
        };

        TelegramCredentials {
            token: pick("TELEGRAM_TOKEN", &self.bot_token),
            chat_id: pick("TELEGRAM_CHAT_ID", &self.chat_id),
        }
    }
}

fn default_output_folder() -> PathBuf {
    PathBuf::from("data")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            output_folder: default_output_folder(),
            db_path: None,
            scrape: ScrapeSettings::default(),
            throttle: ThrottleSettings::default(),
            retry: RetrySettings::default(),
            user_agents: Vec::new(),
            telegram: TelegramSettings::default(),
        }
    }
}

impl Config {
    /// Read, parse and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        info!("Configuration loaded: {} site(s)", config.sites.len());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.output_folder.join("properties.db"))
    }

    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        for site in &self.sites {
            if site.name.trim().is_empty() {
                bail!("Site name cannot be empty (url: {})", site.url);
            }

            let url = Url::parse(&site.url)
                .with_context(|| format!("Site '{}' has an invalid url '{}'", site.name, site.url))?;
            if url.cannot_be_a_base() {
                bail!("Site '{}' url '{}' cannot be used as a base URL", site.name, site.url);
            }

            for selector in std::iter::once(&site.list_selector).chain(site.optional_selectors()) {
                if Selector::parse(selector).is_err() {
                    bail!("Site '{}' has an invalid selector '{}'", site.name, selector);
                }
            }
        }

        if self.throttle.min_sleep_ms > self.throttle.max_sleep_ms {
            bail!(
                "throttle.min_sleep_ms ({}) must not exceed throttle.max_sleep_ms ({})",
                self.throttle.min_sleep_ms,
                self.throttle.max_sleep_ms
            );
        }

        Ok(())
    }
}
