use super::*;
use resale_sniper::models::Tier;

#[tokio::test]
async fn test_iphone_14_pro_pricing_scenarios() -> anyhow::Result<()> {
    let config = get_test_config();
    let source = FakeSource::with_listings(
        "leboncoin",
        vec![
            listing("leboncoin", "a", "iPhone 14 Pro 128Go très bon état", 280),
            listing("leboncoin", "b", "iPhone 14 Pro 256Go écran HS", 250),
            listing("leboncoin", "c", "iPhone 14 Pro violet", 310),
        ],
    );
    let notifier = RecordingNotifier::new();
    let mut pipeline = create_test_pipeline(&config, vec![source], notifier.clone(), SeenStore::in_memory());

    let report = pipeline.run_pass().await;
    assert_eq!(report.alerts_sent, 2);
    assert_eq!(report.rejected, 1);

    let alerts = notifier.sent_alerts();
    let acceptable = alerts.iter().find(|a| a.listing_id == "a").unwrap();
    assert_eq!(acceptable.tier, Tier::Acceptable);
    let targets = acceptable.targets.unwrap();
    assert_eq!(targets.target_aggressive, 254);
    assert_eq!(targets.target_acceptable, 304);

    let aggressive = alerts.iter().find(|a| a.listing_id == "b").unwrap();
    assert_eq!(aggressive.tier, Tier::Aggressive);

    assert!(alerts.iter().all(|a| a.listing_id != "c"));
    Ok(())
}

#[tokio::test]
async fn test_boundary_prices() -> anyhow::Result<()> {
    let config = get_test_config();
    let source = FakeSource::with_listings(
        "leboncoin",
        vec![
            listing("leboncoin", "at-acceptable", "iPhone 14 Pro", 304),
            listing("leboncoin", "above-acceptable", "iPhone 14 Pro", 305),
            listing("leboncoin", "at-aggressive", "iPhone 14 Pro", 254),
        ],
    );
    let notifier = RecordingNotifier::new();
    let mut pipeline = create_test_pipeline(&config, vec![source], notifier.clone(), SeenStore::in_memory());

    pipeline.run_pass().await;

    let alerts = notifier.sent_alerts();
    assert_eq!(alerts.len(), 2);
    let tier_of = |id: &str| alerts.iter().find(|a| a.listing_id == id).map(|a| a.tier);
    assert_eq!(tier_of("at-acceptable"), Some(Tier::Acceptable));
    assert_eq!(tier_of("at-aggressive"), Some(Tier::Aggressive));
    assert_eq!(tier_of("above-acceptable"), None);
    Ok(())
}

#[tokio::test]
async fn test_accessory_listing_is_never_alerted() -> anyhow::Result<()> {
    let config = get_test_config();
    let source = FakeSource::with_listings(
        "leboncoin",
        vec![listing("leboncoin", "case", "Coque iPhone 15 Pro", 5)],
    );
    let notifier = RecordingNotifier::new();
    let mut pipeline = create_test_pipeline(&config, vec![source], notifier.clone(), SeenStore::in_memory());

    let report = pipeline.run_pass().await;
    assert_eq!(report.misses, 1);
    assert_eq!(report.alerts_sent, 0);
    assert!(notifier.sent_alerts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_longest_variant_wins() -> anyhow::Result<()> {
    let config = get_test_config();
    let source = FakeSource::with_listings(
        "leboncoin",
        vec![listing("leboncoin", "max", "iPhone 14 Pro Max 256Go", 300)],
    );
    let notifier = RecordingNotifier::new();
    let mut pipeline = create_test_pipeline(&config, vec![source], notifier.clone(), SeenStore::in_memory());

    pipeline.run_pass().await;

    let alerts = notifier.sent_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].variant.key(), "iphone 14 pro max");
    Ok(())
}

#[tokio::test]
async fn test_same_listing_in_consecutive_passes_alerts_once() -> anyhow::Result<()> {
    let config = get_test_config();
    let source = FakeSource::with_listings(
        "leboncoin",
        vec![listing("leboncoin", "42", "iPhone 13 128Go", 120)],
    );
    let notifier = RecordingNotifier::new();
    let mut pipeline = create_test_pipeline(&config, vec![source.clone()], notifier.clone(), SeenStore::in_memory());

    let first = pipeline.run_pass().await;
    let second = pipeline.run_pass().await;

    assert_eq!(first.alerts_sent, 1);
    assert_eq!(second.alerts_sent, 0);
    assert_eq!(second.duplicates, 1);
    assert_eq!(notifier.sent_alerts().len(), 1);
    assert_eq!(source.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rejected_listing_is_reconsidered_next_pass() -> anyhow::Result<()> {
    let config = get_test_config();
    let source = FakeSource::with_listings(
        "leboncoin",
        vec![listing("leboncoin", "7", "iPhone 14 Pro", 350)],
    );
    let notifier = RecordingNotifier::new();
    let mut pipeline = create_test_pipeline(&config, vec![source.clone()], notifier.clone(), SeenStore::in_memory());

    let first = pipeline.run_pass().await;
    assert_eq!(first.rejected, 1);

    // Seller drops the price
    source.set_listings(vec![listing("leboncoin", "7", "iPhone 14 Pro", 290)]);
    let second = pipeline.run_pass().await;
    assert_eq!(second.alerts_sent, 1);
    Ok(())
}

#[tokio::test]
async fn test_seen_store_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("seen_listings.json");
    let config = get_test_config();
    let listings = vec![listing("leboncoin", "99", "iPhone 12 Pro", 100)];

    {
        let notifier = RecordingNotifier::new();
        let source = FakeSource::with_listings("leboncoin", listings.clone());
        let mut pipeline = create_test_pipeline(&config, vec![source], notifier.clone(), SeenStore::load(&path));

        let report = pipeline.run_pass().await;
        assert_eq!(report.alerts_sent, 1);
        assert!(report.persisted);
    }

    // New process, same file
    let notifier = RecordingNotifier::new();
    let source = FakeSource::with_listings("leboncoin", listings);
    let seen = SeenStore::load(&path);
    assert!(seen.contains("leboncoin:99"));

    let mut pipeline = create_test_pipeline(&config, vec![source], notifier.clone(), seen);
    let report = pipeline.run_pass().await;
    assert_eq!(report.alerts_sent, 0);
    assert_eq!(report.duplicates, 1);
    assert!(notifier.sent_alerts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failing_source_does_not_stop_pass() -> anyhow::Result<()> {
    let config = get_test_config();
    let broken = FakeSource::failing("broken", FailureMode::Unavailable);
    let healthy = FakeSource::with_listings(
        "healthy",
        vec![listing("healthy", "1", "iPhone 14 Pro", 250)],
    );
    let notifier = RecordingNotifier::new();
    let mut pipeline = create_test_pipeline(
        &config,
        vec![broken.clone(), healthy.clone()],
        notifier.clone(),
        SeenStore::in_memory(),
    );

    let report = pipeline.run_pass().await;
    assert_eq!(report.source_errors, 1);
    assert_eq!(report.alerts_sent, 1);
    assert_eq!(broken.calls(), 1);
    assert_eq!(healthy.calls(), 1);

    // Unavailable is not blocked: retried on the next pass
    pipeline.run_pass().await;
    assert_eq!(broken.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_blocked_source_is_rested() -> anyhow::Result<()> {
    let config = get_test_config();
    let blocked = FakeSource::failing("blocked", FailureMode::Blocked);
    let notifier = RecordingNotifier::new();
    let mut pipeline = create_test_pipeline(&config, vec![blocked.clone()], notifier, SeenStore::in_memory());

    for _ in 0..4 {
        pipeline.run_pass().await;
    }

    // Pass 1 blocked, passes 2 and 3 skipped, pass 4 retried
    assert_eq!(blocked.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_reaction_failure_does_not_fail_alert() -> anyhow::Result<()> {
    let config = get_test_config();
    let source = FakeSource::with_listings(
        "leboncoin",
        vec![listing("leboncoin", "1", "iPhone 14 Pro", 250)],
    );
    let notifier = RecordingNotifier::new();
    *notifier.failing_emoji.lock().unwrap() = Some("🚩".to_string());
    let mut pipeline = create_test_pipeline(&config, vec![source], notifier.clone(), SeenStore::in_memory());

    let report = pipeline.run_pass().await;
    assert_eq!(report.alerts_sent, 1);
    assert_eq!(report.reaction_failures, 1);
    assert_eq!(report.dispatch_failures, 0);

    let emojis: Vec<String> = notifier.sent_reactions().into_iter().map(|(_, e)| e).collect();
    assert_eq!(emojis, vec!["✅".to_string(), "❌".to_string(), "📞".to_string()]);

    // Not resent on the next pass
    let second = pipeline.run_pass().await;
    assert_eq!(second.alerts_sent, 0);
    assert_eq!(notifier.sent_alerts().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_dispatch_is_not_retried() -> anyhow::Result<()> {
    let config = get_test_config();
    let source = FakeSource::with_listings(
        "leboncoin",
        vec![listing("leboncoin", "1", "iPhone 14 Pro", 250)],
    );
    let notifier = RecordingNotifier::new();
    notifier.fail_sends.store(true, std::sync::atomic::Ordering::SeqCst);
    let mut pipeline = create_test_pipeline(&config, vec![source], notifier.clone(), SeenStore::in_memory());

    let first = pipeline.run_pass().await;
    assert_eq!(first.dispatch_failures, 1);
    assert!(pipeline.seen().contains("leboncoin:1"));

    notifier.fail_sends.store(false, std::sync::atomic::Ordering::SeqCst);
    let second = pipeline.run_pass().await;
    assert_eq!(second.alerts_sent, 0);
    assert_eq!(second.duplicates, 1);
    Ok(())
}

#[tokio::test]
async fn test_relative_url_resolved_against_source() -> anyhow::Result<()> {
    let config = get_test_config();
    let mut raw = listing("annonces", "5", "iPhone 13 mini", 100);
    raw.url = Some("/annonce/5".to_string());
    raw.images = vec!["".to_string(), "https://img.example/5.jpg".to_string()];

    let source = FakeSource::with_listings("annonces", vec![raw]);
    let notifier = RecordingNotifier::new();
    let mut pipeline = create_test_pipeline(&config, vec![source], notifier.clone(), SeenStore::in_memory());

    pipeline.run_pass().await;

    let alerts = notifier.sent_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(
        alerts[0].url.as_ref().map(|u| u.as_str()),
        Some("https://annonces.example/annonce/5")
    );
    assert_eq!(alerts[0].image.as_deref(), Some("https://img.example/5.jpg"));
    Ok(())
}

#[tokio::test]
async fn test_status_message_at_startup() -> anyhow::Result<()> {
    let config = get_test_config();
    let notifier = RecordingNotifier::new();
    let pipeline = create_test_pipeline(&config, vec![FakeSource::new("leboncoin")], notifier.clone(), SeenStore::in_memory());

    pipeline.announce(&config.discord.status_message).await?;

    assert_eq!(*notifier.texts.lock().unwrap(), vec!["✅ BOT OPÉRATIONNEL".to_string()]);
    Ok(())
}
