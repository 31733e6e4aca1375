use anyhow::{Context, Result};
use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, MetricsConfig};

const LOG_FILE_PREFIX: &str = "resale-sniper.log";

/// Console logging, plus a daily rolling file when `logging.directory` is set.
///
/// `RUST_LOG` wins over the configured filter. Keep the returned guard alive
/// for the life of the process or buffered file output is lost.
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .context("invalid logging filter")?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

/// Start the Prometheus scrape endpoint when enabled. Must run inside the runtime.
pub fn init_metrics(config: &MetricsConfig) -> Result<Option<SocketAddr>> {
    if !config.enabled {
        return Ok(None);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;

    describe_counters();
    Ok(Some(addr))
}

pub fn describe_counters() {
    describe_counter!("passes_total", "Scan passes completed.");
    describe_counter!("failed_passes_total", "Scan passes aborted by a panic.");
    describe_counter!("listings_fetched_total", "Raw listings returned by sources.");
    describe_counter!("listing_parse_failures_total", "Source records that could not be decoded.");
    describe_counter!("listings_classified_total", "Listings matched to a product variant with a price.");
    describe_counter!("listings_missed_total", "Listings dropped by the classifier.");
    describe_counter!("listings_duplicate_total", "Listings skipped as already alerted.");
    describe_counter!("alerts_sent_total", "Alerts delivered to the notification channel.");
    describe_counter!("dispatch_failures_total", "Alerts whose send failed.");
    describe_counter!("source_errors_total", "Failed source fetches.");
    describe_counter!("persistence_failures_total", "Failed writes of the seen listings file.");
}
