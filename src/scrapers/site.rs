use crate::config::{Config, ScrapeSettings, SiteConfig, ThrottleSettings};
use crate::error::ScrapeError;
use crate::models::ListingRecord;
use crate::scrapers::traits::PageDriver;
use crate::scrapers::user_agent::choose_user_agent;
use chrono::NaiveDate;
use rand::Rng;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Selectors for one site, parsed once per visit.
struct SiteSelectors {
    list: Selector,
    title: Option<Selector>,
    price: Option<Selector>,
    details: Option<Selector>,
    url: Option<Selector>,
}

impl SiteSelectors {
    fn parse(site: &SiteConfig) -> Result<Self, ScrapeError> {
        let optional = |selector: &Option<String>| -> Result<Option<Selector>, ScrapeError> {
            selector.as_deref().map(parse_selector).transpose()
        };

        Ok(Self {
            list: parse_selector(&site.list_selector)?,
            title: optional(&site.title_selector)?,
            price: optional(&site.price_selector)?,
            details: optional(&site.details_selector)?,
            url: optional(&site.url_selector)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|_| ScrapeError::InvalidSelector(selector.to_string()))
}

/// Visits configured sites through a shared page and turns their cards into
/// [`ListingRecord`]s.
pub struct SiteScraper<'a> {
    scrape: &'a ScrapeSettings,
    throttle: &'a ThrottleSettings,
    user_agents: &'a [String],
    scraped_date: NaiveDate,
}

impl<'a> SiteScraper<'a> {
    /// `scraped_date` is stamped on every record produced by this scraper.
    pub fn new(config: &'a Config, scraped_date: NaiveDate) -> Self {
        Self {
            scrape: &config.scrape,
            throttle: &config.throttle,
            user_agents: &config.user_agents,
            scraped_date,
        }
    }

    /// Scrape one site.
    ///
    /// Only navigation can fail. A missing list selector yields an empty
    /// result and broken cards are skipped.
    pub async fn scrape<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        site: &SiteConfig,
    ) -> Result<Vec<ListingRecord>, ScrapeError> {
        let user_agent = choose_user_agent(self.user_agents);
        if !page.set_user_agent(user_agent).await {
            debug!("Continuing {} without custom user agent", site.name);
        }

        page.goto(&site.url, self.scrape.navigation_timeout()).await?;

        // let client-side rendering settle
        tokio::time::sleep(self.scrape.settle_delay()).await;

        if !page
            .wait_for_selector(&site.list_selector, self.scrape.selector_timeout())
            .await
        {
            warn!(
                "No elements matching '{}' on {} ({})",
                site.list_selector, site.name, site.url
            );
            return Ok(Vec::new());
        }

        let html = page.content().await?;
        let records = self.extract(&html, site);

        self.throttle().await;

        Ok(records)
    }

    /// Pull records out of a rendered page. Cards that fail are logged and
    /// skipped.
    pub fn extract(&self, html: &str, site: &SiteConfig) -> Vec<ListingRecord> {
        let selectors = match SiteSelectors::parse(site) {
            Ok(selectors) => selectors,
            Err(e) => {
                warn!("Skipping {}: {}", site.name, e);
                return Vec::new();
            }
        };

        let document = Html::parse_document(html);
        let cards: Vec<_> = document.select(&selectors.list).collect();
        info!("Found {} cards on {}", cards.len(), site.name);

        let mut records = Vec::with_capacity(cards.len());
        for (idx, card) in cards.into_iter().enumerate() {
            match self.parse_card(card, &selectors, site) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Card parse error on {} (card {}): {}", site.name, idx, e),
            }
        }

        records
    }

    fn parse_card(
        &self,
        card: ElementRef<'_>,
        selectors: &SiteSelectors,
        site: &SiteConfig,
    ) -> Result<ListingRecord, ScrapeError> {
        let mut record = ListingRecord::new(site.name.clone(), self.scraped_date);

        record.title = card_text(card, selectors.title.as_ref());
        record.price = card_text(card, selectors.price.as_ref());
        record.details = card_text(card, selectors.details.as_ref());

        let href = selectors
            .url
            .as_ref()
            .and_then(|selector| card.select(selector).next())
            .and_then(|link| link.value().attr("href"))
            .unwrap_or("")
            .trim();
        if !href.is_empty() {
            record.url = resolve_url(&site.url, href)?;
        }

        Ok(record)
    }

    async fn throttle(&self) {
        let (min, max) = (self.throttle.min_sleep_ms, self.throttle.max_sleep_ms);
        let millis = if min >= max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        debug!("Throttling for {} ms", millis);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// Trimmed text of the first match inside `card`, or empty.
fn card_text(card: ElementRef<'_>, selector: Option<&Selector>) -> String {
    selector
        .and_then(|selector| card.select(selector).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Resolve `href` against the site URL unless it already carries a scheme.
pub fn resolve_url(base: &str, href: &str) -> Result<String, ScrapeError> {
    if Url::parse(href).is_ok() {
        return Ok(href.to_string());
    }

    let base = Url::parse(base).map_err(|e| ScrapeError::InvalidUrl(base.to_string(), e))?;
    base.join(href)
        .map(String::from)
        .map_err(|e| ScrapeError::InvalidUrl(href.to_string(), e))
}
