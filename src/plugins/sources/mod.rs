// Listing source implementations
pub mod html;
pub mod leboncoin;

pub use html::HtmlSource;
pub use leboncoin::LeboncoinSource;

use std::sync::Arc;

use crate::config::{ScraperConfig, SourceConfig};
use crate::plugins::traits::ListingSource;
use crate::utils::error::Result;

/// Build one source per enabled configuration entry, in configuration order.
pub fn build_sources(configs: &[SourceConfig], scraper: &ScraperConfig) -> Result<Vec<Arc<dyn ListingSource>>> {
    let mut sources: Vec<Arc<dyn ListingSource>> = Vec::new();

    for config in configs.iter().filter(|c| c.enabled()) {
        let source: Arc<dyn ListingSource> = match config {
            SourceConfig::Leboncoin(c) => Arc::new(LeboncoinSource::new(c.clone(), scraper)?),
            SourceConfig::Html(c) => Arc::new(HtmlSource::new(c.clone(), scraper)?),
        };
        tracing::info!(source = source.name(), "Registered listing source");
        sources.push(source);
    }

    Ok(sources)
}
