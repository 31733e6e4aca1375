use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use resale_sniper::config::AppConfig;
use resale_sniper::dedup::SeenStore;
use resale_sniper::pipeline::ListingPipeline;
use resale_sniper::plugins::notifiers::DiscordNotifier;
use resale_sniper::plugins::sources::build_sources;
use resale_sniper::scheduler::ScanScheduler;
use resale_sniper::telemetry;

#[derive(Debug, Parser)]
#[command(name = "resale-sniper", version, about = "Watches marketplaces for underpriced phones")]
struct Cli {
    /// Extra configuration file layered over the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single scan pass and exit
    #[arg(long)]
    once: bool,

    /// Skip the startup status message
    #[arg(long)]
    no_status: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Initialize tracing
    let _log_guard = telemetry::init_tracing(&config.logging)?;

    if let Some(addr) = telemetry::init_metrics(&config.metrics)? {
        info!(%addr, "Prometheus exporter listening");
    }

    info!("Starting Resale Sniper...");

    let sources = build_sources(&config.sources, &config.scraper)?;
    let notifier = Arc::new(DiscordNotifier::new(&config.discord)?);
    let seen = SeenStore::load(&config.seen_store.path);

    let pipeline = ListingPipeline::from_config(&config, sources, notifier, seen);

    if !cli.no_status {
        // A dead channel is worth knowing about, but not worth refusing to scan
        if let Err(e) = pipeline.announce(&config.discord.status_message).await {
            tracing::error!(error = %e, "Failed to send status message");
        }
    }

    let mut scheduler = ScanScheduler::new(pipeline, Duration::from_secs(config.scheduler.interval_secs));

    if cli.once {
        match scheduler.run_once().await {
            Some(report) => info!(alerts = report.alerts_sent, fetched = report.fetched, "Single pass finished"),
            None => anyhow::bail!("scan pass panicked"),
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            // Dropping the sender would stop the scheduler
            std::future::pending::<()>().await;
        }
        info!("Shutting down...");
        let _ = shutdown_tx.send(true);
    });

    let stats = scheduler.run(shutdown_rx).await;
    info!(passes = stats.passes, alerts = stats.alerts_sent, "Stopped");

    Ok(())
}
