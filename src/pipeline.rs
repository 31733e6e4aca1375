use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use url::Url;

use crate::classifier::{Classification, Classifier};
use crate::config::AppConfig;
use crate::dedup::SeenStore;
use crate::emitter::AlertEmitter;
use crate::models::RawListing;
use crate::plugins::manager::SourceRegistry;
use crate::plugins::traits::{ListingSource, MessageId, Notifier};
use crate::pricing::PriceModel;
use crate::scorer::{Scorer, Verdict};
use crate::utils::error::Result;

/// Counters for one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub sources_checked: usize,
    pub sources_skipped: usize,
    pub source_errors: usize,
    pub fetched: usize,
    pub classified: usize,
    pub misses: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub alerts_sent: usize,
    pub dispatch_failures: usize,
    pub reaction_failures: usize,
    pub persisted: bool,
    pub total_time_ms: u64,
}

/// Fetch → classify → dedup → score → emit, one pass at a time.
///
/// Owns all mutable state of the bot (seen set, debug counter, source
/// cooldowns); passes must not overlap, which `&mut self` enforces.
pub struct ListingPipeline {
    sources: SourceRegistry,
    search_terms: Vec<String>,
    classifier: Classifier,
    seen: SeenStore,
    scorer: Scorer,
    emitter: AlertEmitter,
}

impl ListingPipeline {
    pub fn new(
        sources: SourceRegistry,
        search_terms: Vec<String>,
        classifier: Classifier,
        seen: SeenStore,
        scorer: Scorer,
        emitter: AlertEmitter,
    ) -> Self {
        Self {
            sources,
            search_terms,
            classifier,
            seen,
            scorer,
            emitter,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        sources: Vec<Arc<dyn ListingSource>>,
        notifier: Arc<dyn Notifier>,
        seen: SeenStore,
    ) -> Self {
        Self::new(
            SourceRegistry::with_sources(sources, config.scraper.blocked_cooldown_passes),
            config.search_terms(),
            Classifier::from_config(config),
            seen,
            Scorer::new(PriceModel::from_config(&config.pricing)).with_debug(&config.debug),
            AlertEmitter::new(notifier, config.discord.reactions.clone()),
        )
    }

    pub fn seen(&self) -> &SeenStore {
        &self.seen
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Startup status line.
    pub async fn announce(&self, text: &str) -> Result<MessageId> {
        let id = self.emitter.send_status(text).await?;
        tracing::info!(notifier = self.emitter.notifier_name(), message = %id, "Status message sent");
        Ok(id)
    }

    /// Run one scan pass. Every failure below the pass is contained and counted.
    pub async fn run_pass(&mut self) -> PassReport {
        let start_time = Instant::now();
        let mut report = PassReport::default();

        let total = self.sources.len();
        let ready = self.sources.ready_sources();
        report.sources_skipped = total - ready.len();

        let terms = self.search_terms.clone();
        for source in ready {
            report.sources_checked += 1;
            let base_url = source.base_url();

            for term in &terms {
                let listings = match source.fetch(term).await {
                    Ok(listings) => listings,
                    Err(e) => {
                        report.source_errors += 1;
                        metrics::counter!("source_errors_total", "source" => source.name().to_string())
                            .increment(1);

                        if e.is_blocked() {
                            tracing::warn!(source = source.name(), term = %term, error = %e, "Source blocked");
                            self.sources.mark_blocked(source.name());
                            break;
                        }
                        tracing::error!(source = source.name(), term = %term, error = %e, "Fetch failed");
                        continue;
                    }
                };

                if listings.is_empty() {
                    tracing::debug!(source = source.name(), term = %term, "No listings returned");
                }
                report.fetched += listings.len();
                metrics::counter!("listings_fetched_total", "source" => source.name().to_string())
                    .increment(listings.len() as u64);

                for raw in &listings {
                    self.process_listing(raw, base_url.as_ref(), &mut report).await;
                }
            }
        }

        if self.seen.is_dirty() {
            match self.seen.flush() {
                Ok(written) => report.persisted = written,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to persist seen listings");
                    metrics::counter!("persistence_failures_total").increment(1);
                }
            }
        }

        report.total_time_ms = start_time.elapsed().as_millis() as u64;
        metrics::counter!("passes_total").increment(1);

        tracing::info!(
            sources = report.sources_checked,
            fetched = report.fetched,
            classified = report.classified,
            duplicates = report.duplicates,
            alerts = report.alerts_sent,
            errors = report.source_errors,
            elapsed_ms = report.total_time_ms,
            "Scan pass complete"
        );

        report
    }

    async fn process_listing(&mut self, raw: &RawListing, base_url: Option<&Url>, report: &mut PassReport) {
        let key = raw.seen_key();
        if self.seen.contains(&key) {
            report.duplicates += 1;
            metrics::counter!("listings_duplicate_total").increment(1);
            return;
        }

        let listing = match self.classifier.classify(raw, base_url) {
            Classification::Tracked(listing) => listing,
            Classification::Miss(reason) => {
                report.misses += 1;
                metrics::counter!("listings_missed_total").increment(1);
                tracing::trace!(listing = %key, reason = ?reason, "Classification miss");
                return;
            }
        };
        report.classified += 1;
        metrics::counter!("listings_classified_total").increment(1);

        let alert = match self.scorer.score(&listing) {
            Verdict::Alert(alert) => alert,
            Verdict::Reject(reason) => {
                report.rejected += 1;
                tracing::debug!(listing = %key, reason = ?reason, "Listing rejected");
                return;
            }
        };

        // Marked before the send: at most one alert per listing, even if the send fails
        self.seen.insert(key.clone());

        match self.emitter.emit(&alert).await {
            Ok(emitted) => {
                report.alerts_sent += 1;
                report.reaction_failures += emitted.failed_reactions();
                metrics::counter!("alerts_sent_total", "tier" => alert.tier.as_str()).increment(1);
                tracing::info!(
                    listing = %key,
                    tier = alert.tier.as_str(),
                    price = alert.price,
                    variant = %alert.variant,
                    message = %emitted.message_id,
                    "Alert sent"
                );
            }
            Err(e) => {
                report.dispatch_failures += 1;
                metrics::counter!("dispatch_failures_total").increment(1);
                tracing::error!(listing = %key, error = %e, "Failed to dispatch alert");
            }
        }
    }
}
