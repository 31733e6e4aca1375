use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::{HtmlSourceConfig, ScraperConfig};
use crate::models::{RawListing, RawPrice};
use crate::plugins::traits::ListingSource;
use crate::scraper::{HttpSession, mentions_anti_bot};
use crate::utils::error::{AppError, Result};

/// Search-results page scraped with CSS selectors.
pub struct HtmlSource {
    config: HtmlSourceConfig,
    site_url: Option<Url>,
    session: HttpSession,
}

impl HtmlSource {
    pub fn new(config: HtmlSourceConfig, scraper: &ScraperConfig) -> Result<Self> {
        // Fail at startup on a bad selector rather than on every pass
        for selector in [
            Some(&config.item_selector),
            Some(&config.title_selector),
            Some(&config.price_selector),
            Some(&config.link_selector),
            config.image_selector.as_ref(),
        ]
        .into_iter()
        .flatten()
        {
            parse_selector(selector)?;
        }

        let session = HttpSession::new(&config.name, scraper, config.consent_url.clone())?;
        let site_url = Url::parse(&config.site_url).ok();

        Ok(Self {
            config,
            site_url,
            session,
        })
    }

    pub fn search_url(&self, term: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
        self.config.search_url.replace("{query}", &encoded)
    }

    /// Extract listings from a results page. Items without an id are skipped.
    pub fn parse_page(&self, body: &str) -> Result<Vec<RawListing>> {
        let document = Html::parse_document(body);
        let item_selector = parse_selector(&self.config.item_selector)?;
        let title_selector = parse_selector(&self.config.title_selector)?;
        let price_selector = parse_selector(&self.config.price_selector)?;
        let link_selector = parse_selector(&self.config.link_selector)?;
        let image_selector = self
            .config
            .image_selector
            .as_deref()
            .map(parse_selector)
            .transpose()?;

        let mut listings = Vec::new();
        for (index, item) in document.select(&item_selector).enumerate() {
            let link = item
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| href.trim().to_string())
                .filter(|href| !href.is_empty());

            let id = self
                .config
                .id_attribute
                .as_deref()
                .and_then(|attr| item.value().attr(attr))
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .or_else(|| link.clone());

            let Some(id) = id else {
                tracing::warn!(source = %self.config.name, index, "Skipping item without id or link");
                metrics::counter!("listing_parse_failures_total").increment(1);
                continue;
            };

            let images = image_selector
                .as_ref()
                .and_then(|sel| item.select(sel).next())
                .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
                .map(|src| vec![src.to_string()])
                .unwrap_or_default();

            listings.push(RawListing {
                source: self.config.name.clone(),
                id,
                title: first_text(&item, &title_selector, char::is_whitespace),
                // No-break spaces in a price are thousands separators
                price: first_text(&item, &price_selector, |c| c.is_ascii_whitespace())
                    .map(RawPrice::Text),
                url: link,
                images,
            });
        }

        Ok(listings)
    }
}

#[async_trait]
impl ListingSource for HtmlSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn base_url(&self) -> Option<Url> {
        self.site_url.clone()
    }

    async fn fetch(&self, term: &str) -> Result<Vec<RawListing>> {
        let request = self
            .session
            .client()
            .get(self.search_url(term))
            .header("Accept", "text/html");

        let body = self.session.send_text(request).await?;
        let listings = self.parse_page(&body)?;

        // An empty page carrying anti-bot scripts is a soft block
        if listings.is_empty() && mentions_anti_bot(&body) {
            self.session.reset_consent();
            return Err(AppError::blocked(&self.config.name, "empty results behind anti-bot page"));
        }
        Ok(listings)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| AppError::Validation(format!("Invalid CSS selector '{}': {:?}", selector, e)))
}

fn first_text(item: &ElementRef, selector: &Selector, is_space: fn(char) -> bool) -> Option<String> {
    item.select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| {
            text.split(is_space)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
}
