// Integration tests for Resale Sniper
// These tests drive the pipeline and scheduler through in-process fakes and
// mock HTTP servers, never the real marketplace or Discord.

pub mod pipeline_tests;
pub mod scheduler_tests;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

use resale_sniper::AppConfig;
use resale_sniper::dedup::SeenStore;
use resale_sniper::models::{Alert, RawListing, RawPrice};
use resale_sniper::pipeline::ListingPipeline;
use resale_sniper::plugins::traits::{ListingSource, MessageId, Notifier};
use resale_sniper::utils::error::{AppError, Result};

/// Defaults plus the credentials validation insists on.
pub fn get_test_config() -> AppConfig {
    AppConfig::from_toml(
        r#"
        [discord]
        bot_token = "test-token"
        channel_id = "123456789"
        "#,
    )
    .expect("test configuration must be valid")
}

pub fn listing(source: &str, id: &str, title: &str, price: i64) -> RawListing {
    let mut listing = RawListing::new(source, id);
    listing.title = Some(title.to_string());
    listing.price = Some(RawPrice::Amount(Decimal::from(price)));
    listing
}

#[derive(Clone, Copy)]
pub enum FailureMode {
    Unavailable,
    Blocked,
}

/// Source returning whatever listings the test last set.
pub struct FakeSource {
    name: String,
    base_url: Option<Url>,
    listings: Mutex<Vec<RawListing>>,
    failure: Mutex<Option<FailureMode>>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            base_url: Url::parse(&format!("https://{}.example", name)).ok(),
            listings: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with_listings(name: &str, listings: Vec<RawListing>) -> Arc<Self> {
        let source = Self::new(name);
        source.set_listings(listings);
        source
    }

    pub fn failing(name: &str, mode: FailureMode) -> Arc<Self> {
        let source = Self::new(name);
        *source.failure.lock().unwrap() = Some(mode);
        source
    }

    pub fn set_listings(&self, listings: Vec<RawListing>) {
        *self.listings.lock().unwrap() = listings;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingSource for FakeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> Option<Url> {
        self.base_url.clone()
    }

    async fn fetch(&self, _term: &str) -> Result<Vec<RawListing>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.failure.lock().unwrap() {
            Some(FailureMode::Unavailable) => Err(AppError::unavailable(&self.name, "status 502")),
            Some(FailureMode::Blocked) => Err(AppError::blocked(&self.name, "status 403")),
            None => Ok(self.listings.lock().unwrap().clone()),
        }
    }
}

/// Notifier recording everything it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<Alert>>,
    pub texts: Mutex<Vec<String>>,
    pub reactions: Mutex<Vec<(MessageId, String)>>,
    pub failing_emoji: Mutex<Option<String>>,
    pub fail_sends: AtomicBool,
    next_id: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent_alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn sent_reactions(&self) -> Vec<(MessageId, String)> {
        self.reactions.lock().unwrap().clone()
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_text(&self, text: &str) -> Result<MessageId> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(self.next_message_id())
    }

    async fn send_alert(&self, alert: &Alert) -> Result<MessageId> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AppError::dispatch("recording", "status 503"));
        }
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(self.next_message_id())
    }

    async fn add_reaction(&self, message: &MessageId, emoji: &str) -> Result<()> {
        if self.failing_emoji.lock().unwrap().as_deref() == Some(emoji) {
            return Err(AppError::dispatch("recording", "reaction rate limited"));
        }
        self.reactions.lock().unwrap().push((message.clone(), emoji.to_string()));
        Ok(())
    }
}

pub fn create_test_pipeline(
    config: &AppConfig,
    sources: Vec<Arc<FakeSource>>,
    notifier: Arc<RecordingNotifier>,
    seen: SeenStore,
) -> ListingPipeline {
    let sources: Vec<Arc<dyn ListingSource>> = sources
        .into_iter()
        .map(|s| s as Arc<dyn ListingSource>)
        .collect();
    ListingPipeline::from_config(config, sources, notifier, seen)
}
