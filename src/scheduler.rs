use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::watch;

use crate::pipeline::{ListingPipeline, PassReport};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub passes: u64,
    pub failed_passes: u64,
    pub alerts_sent: u64,
    pub uptime_seconds: u64,
}

/// Runs scan passes back to back with a fixed pause in between.
///
/// A pass always finishes before the next one starts; a shutdown signal stops
/// new passes and interrupts the pause, never a pass in flight.
pub struct ScanScheduler {
    pipeline: ListingPipeline,
    interval: Duration,
    stats: SchedulerStats,
    start_time: DateTime<Utc>,
}

impl ScanScheduler {
    pub fn new(pipeline: ListingPipeline, interval: Duration) -> Self {
        Self {
            pipeline,
            interval,
            stats: SchedulerStats::default(),
            start_time: Utc::now(),
        }
    }

    /// Execute a single pass. A panic inside the pass is caught and counted.
    pub async fn run_once(&mut self) -> Option<PassReport> {
        self.stats.passes += 1;

        match AssertUnwindSafe(self.pipeline.run_pass()).catch_unwind().await {
            Ok(report) => {
                self.stats.alerts_sent += report.alerts_sent as u64;
                Some(report)
            }
            Err(panic) => {
                self.stats.failed_passes += 1;
                metrics::counter!("failed_passes_total").increment(1);
                tracing::error!(panic = %panic_message(panic.as_ref()), "Scan pass panicked");
                None
            }
        }
    }

    /// Loop until `shutdown` turns true or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SchedulerStats {
        tracing::info!(interval_secs = self.interval.as_secs(), "Scan scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        let stats = self.get_stats();
        tracing::info!(
            passes = stats.passes,
            failed = stats.failed_passes,
            alerts = stats.alerts_sent,
            uptime_seconds = stats.uptime_seconds,
            "Scan scheduler stopped"
        );
        stats
    }

    pub fn get_stats(&self) -> SchedulerStats {
        let uptime = Utc::now().signed_duration_since(self.start_time);
        SchedulerStats {
            uptime_seconds: uptime.num_seconds().max(0) as u64,
            ..self.stats.clone()
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
