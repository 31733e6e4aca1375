use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use std::str::FromStr;
use url::Url;

use crate::config::{LeboncoinConfig, ScraperConfig};
use crate::models::{RawListing, RawPrice};
use crate::plugins::traits::ListingSource;
use crate::scraper::HttpSession;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    ads: Vec<Value>,
}

// Every field is optional: the API drops or renames fields without notice.
#[derive(Debug, Deserialize)]
struct AdRecord {
    list_id: Option<Value>,
    subject: Option<String>,
    price: Option<Value>,
    price_cents: Option<i64>,
    url: Option<String>,
    images: Option<AdImages>,
}

#[derive(Debug, Deserialize)]
struct AdImages {
    #[serde(default)]
    urls_large: Vec<String>,
    #[serde(default)]
    urls: Vec<String>,
    thumb_url: Option<String>,
}

/// Leboncoin finder API, newest listings first.
pub struct LeboncoinSource {
    config: LeboncoinConfig,
    site_url: Option<Url>,
    session: HttpSession,
}

impl LeboncoinSource {
    pub fn new(config: LeboncoinConfig, scraper: &ScraperConfig) -> Result<Self> {
        let session = HttpSession::new(&config.name, scraper, config.consent_url.clone())?;
        let site_url = Url::parse(&config.site_url).ok();

        Ok(Self {
            config,
            site_url,
            session,
        })
    }

    pub fn build_query(&self, term: &str) -> Value {
        let mut filters = json!({
            "enums": { "ad_type": ["offer"] },
            "keywords": { "text": term },
        });
        if let Some(category) = &self.config.category {
            filters["category"] = json!({ "id": category });
        }

        json!({
            "filters": filters,
            "limit": self.config.limit,
            "offset": self.config.offset,
            "sort_by": "time",
            "sort_order": "desc",
            "owner_type": "all",
        })
    }
}

#[async_trait]
impl ListingSource for LeboncoinSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn base_url(&self) -> Option<Url> {
        self.site_url.clone()
    }

    async fn fetch(&self, term: &str) -> Result<Vec<RawListing>> {
        let mut request = self
            .session
            .client()
            .post(&self.config.api_url)
            .header("Accept", "application/json")
            .json(&self.build_query(term));

        if let Some(api_key) = &self.config.api_key {
            request = request.header("api_key", api_key);
        }

        let body = self.session.send_text(request).await?;
        parse_search_response(&self.config.name, &body)
    }
}

/// Decode a finder response. Undecodable ads are logged and skipped.
pub fn parse_search_response(source_name: &str, body: &str) -> Result<Vec<RawListing>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| AppError::unavailable(source_name, format!("malformed payload: {}", e)))?;

    let mut listings = Vec::with_capacity(response.ads.len());
    for (index, ad) in response.ads.into_iter().enumerate() {
        match parse_ad(source_name, ad) {
            Ok(listing) => listings.push(listing),
            Err(e) => {
                tracing::warn!(source = source_name, index, error = %e, "Skipping undecodable ad");
                metrics::counter!("listing_parse_failures_total").increment(1);
            }
        }
    }
    Ok(listings)
}

fn parse_ad(source_name: &str, ad: Value) -> Result<RawListing> {
    let record: AdRecord = serde_json::from_value(ad).map_err(|e| AppError::Parse {
        message: e.to_string(),
    })?;

    let id = match record.list_id {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        _ => {
            return Err(AppError::Parse {
                message: "ad without list_id".to_string(),
            });
        }
    };

    let price = record
        .price
        .as_ref()
        .and_then(price_from_value)
        .or_else(|| record.price_cents.map(|cents| RawPrice::Amount(Decimal::new(cents, 2))));

    let images = record
        .images
        .map(|images| {
            let mut urls = if images.urls_large.is_empty() {
                images.urls
            } else {
                images.urls_large
            };
            if urls.is_empty() {
                urls.extend(images.thumb_url);
            }
            urls
        })
        .unwrap_or_default();

    Ok(RawListing {
        source: source_name.to_string(),
        id,
        title: record.subject,
        price,
        url: record.url,
        images,
    })
}

// `price` is usually `[280]`, sometimes a bare number or string.
fn price_from_value(value: &Value) -> Option<RawPrice> {
    match value {
        Value::Array(items) => items.first().and_then(price_from_value),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok().map(RawPrice::Amount),
        Value::String(s) => Some(RawPrice::Text(s.clone())),
        _ => None,
    }
}
