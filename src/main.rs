mod config;
mod error;
mod models;
mod notify;
mod orchestrator;
mod retry;
mod scrapers;
mod storage;
#[cfg(test)]
mod testutil;

use clap::Parser;
use config::Config;
use notify::TelegramNotifier;
use orchestrator::Orchestrator;
use scrapers::ChromeLauncher;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listing-scout", version, about = "Config-driven listing scraper")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SCOUT_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    info!("🔎 Listing Scout starting");

    let config = Config::load(&cli.config)?;

    let notifier = config
        .telegram
        .enabled
        .then(|| TelegramNotifier::from_settings(&config.telegram));

    let orchestrator = Orchestrator::new(config, ChromeLauncher, notifier);
    let summary = orchestrator.run().await?;

    info!(
        "✅ Collected {} listings from {} site(s)",
        summary.records, summary.sites_scraped
    );

    if summary.is_partial() {
        warn!("Sites that failed: {}", summary.failed_sites.join(", "));
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}
