use super::*;
use resale_sniper::scheduler::ScanScheduler;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::test]
async fn test_scheduler_runs_until_shutdown() -> anyhow::Result<()> {
    let config = get_test_config();
    let source = FakeSource::with_listings(
        "leboncoin",
        vec![listing("leboncoin", "1", "iPhone 14 Pro", 250)],
    );
    let notifier = RecordingNotifier::new();
    let pipeline = create_test_pipeline(&config, vec![source.clone()], notifier.clone(), SeenStore::in_memory());

    let scheduler = ScanScheduler::new(pipeline, Duration::from_millis(20));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    let ran_twice = wait_for_condition(|| source.calls() >= 2, 5).await;
    assert!(ran_twice, "scheduler should keep passing");

    shutdown_tx.send(true)?;
    let stats = tokio::time::timeout(Duration::from_secs(5), handle).await??;

    assert!(stats.passes >= 2);
    assert_eq!(stats.failed_passes, 0);
    // Same listing every pass, one alert
    assert_eq!(stats.alerts_sent, 1);
    assert_eq!(notifier.sent_alerts().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_scheduler_stops_when_sender_dropped() -> anyhow::Result<()> {
    let config = get_test_config();
    let pipeline = create_test_pipeline(
        &config,
        vec![FakeSource::new("leboncoin")],
        RecordingNotifier::new(),
        SeenStore::in_memory(),
    );

    let scheduler = ScanScheduler::new(pipeline, Duration::from_secs(3600));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(shutdown_tx);

    let stats = tokio::time::timeout(Duration::from_secs(5), handle).await??;
    assert_eq!(stats.passes, 1);
    Ok(())
}

#[tokio::test]
async fn test_single_pass_mode() -> anyhow::Result<()> {
    let config = get_test_config();
    let broken = FakeSource::failing("broken", FailureMode::Unavailable);
    let pipeline = create_test_pipeline(&config, vec![broken], RecordingNotifier::new(), SeenStore::in_memory());

    let mut scheduler = ScanScheduler::new(pipeline, Duration::from_secs(60));
    let report = scheduler.run_once().await.expect("pass should not panic");

    assert_eq!(report.source_errors, 1);
    assert_eq!(scheduler.get_stats().passes, 1);
    assert_eq!(scheduler.get_stats().failed_passes, 0);
    Ok(())
}

/// Poll a synchronous condition until it holds or the timeout elapses.
pub async fn wait_for_condition<F>(mut condition: F, timeout_seconds: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(timeout_seconds);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}
