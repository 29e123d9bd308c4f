use crate::config::Config;
use crate::models::ListingRecord;
use crate::notify::Notifier;
use crate::retry::retry_with_backoff;
use crate::scrapers::{BrowserLauncher, PageDriver, SiteScraper};
use crate::storage::{export_path, write_csv, ListingStore};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Outcome of one full run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    /// Dated export path, written only when `records > 0`
    pub export_path: PathBuf,
    pub sites_scraped: usize,
    pub failed_sites: Vec<String>,
}

impl RunSummary {
    pub fn is_partial(&self) -> bool {
        !self.failed_sites.is_empty()
    }

    pub fn message(&self) -> String {
        format!(
            "Scraping finished: {} listings saved. File: {}",
            self.records,
            self.export_path.display()
        )
    }
}

/// Drives one scrape run: sites → records → CSV + SQLite → notification.
pub struct Orchestrator<L, N> {
    config: Config,
    launcher: L,
    notifier: Option<N>,
}

impl<L, N> Orchestrator<L, N>
where
    L: BrowserLauncher,
    N: Notifier,
{
    /// `notifier` is only consulted when `telegram.enabled` is set.
    pub fn new(config: Config, launcher: L, notifier: Option<N>) -> Self {
        Self {
            config,
            launcher,
            notifier,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        self.run_on(Utc::now().date_naive()).await
    }

    /// Run with an explicit scrape date; `run` uses today's UTC date.
    pub async fn run_on(&self, scraped_date: NaiveDate) -> Result<RunSummary> {
        let config = &self.config;

        tokio::fs::create_dir_all(&config.output_folder)
            .await
            .with_context(|| {
                format!("Failed to create output folder {}", config.output_folder.display())
            })?;

        let store = ListingStore::new(config.db_path());
        store.init_schema().await?;

        let (records, failed_sites) = {
            // page (and the browser behind it) is dropped at the end of this block,
            // including when a `?` bails out early
            let page = self
                .launcher
                .launch(config.scrape.headless)
                .context("Failed to start browser session")?;
            self.scrape_all(&page, scraped_date).await
        };
        info!("Browser session closed");

        let export_path = export_path(&config.output_folder, scraped_date);

        if records.is_empty() {
            warn!("No listings collected, skipping export and database write");
        } else {
            write_csv(&export_path, &records)?;
            store.append_records(&records).await?;
            info!(
                "{} holds {} listings",
                store.path().display(),
                store.count_records().await?
            );
        }

        let summary = RunSummary {
            records: records.len(),
            export_path,
            sites_scraped: config.sites.len() - failed_sites.len(),
            failed_sites,
        };

        if config.telegram.enabled {
            if let Some(notifier) = &self.notifier {
                let _ = notifier.send(&summary.message()).await;
            }
        }

        info!("Done.");
        Ok(summary)
    }

    /// Scrape every site in order. Failing sites are logged and skipped.
    async fn scrape_all<P: PageDriver>(
        &self,
        page: &P,
        scraped_date: NaiveDate,
    ) -> (Vec<ListingRecord>, Vec<String>) {
        let config = &self.config;
        let scraper = SiteScraper::new(config, scraped_date);
        let mut all_records = Vec::new();
        let mut failed_sites = Vec::new();

        for site in &config.sites {
            info!("Scraping {} ({})", site.name, site.url);

            let result = retry_with_backoff(
                || scraper.scrape(page, site),
                config.retry.max_attempts,
                config.retry.base_delay(),
            )
            .await;

            match result {
                Ok(records) => {
                    info!("Scraped {} from {}", records.len(), site.name);
                    all_records.extend(records);
                }
                Err(e) if e.is_timeout() => {
                    error!("Timeout for {}: {}", site.name, e);
                    failed_sites.push(site.name.clone());
                }
                Err(e) => {
                    error!("Failed site {}: {}", site.name, e);
                    failed_sites.push(site.name.clone());
                }
            }
        }

        (all_records, failed_sites)
    }
}
