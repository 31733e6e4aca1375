use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AppConfig;
use crate::models::{ClassifiedListing, ProductVariant, RawListing, VariantCatalog};
use crate::plugins::trackers::{ModelMatch, ModelMatcher, PriceExtractor};

/// Why a raw listing was dropped before scoring. Not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MissReason {
    NoTitle,
    Accessory(String),
    UnknownModel,
    NoPrice,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Tracked(ClassifiedListing),
    Miss(MissReason),
}

pub struct Classifier {
    models: ModelMatcher,
    prices: PriceExtractor,
}

impl Classifier {
    pub fn new(models: ModelMatcher, prices: PriceExtractor) -> Self {
        Self { models, prices }
    }

    /// Catalog: priced variants first, then recognised-only variants, in config order.
    pub fn from_config(config: &AppConfig) -> Self {
        let keys = config
            .pricing
            .variants
            .iter()
            .map(|v| v.key.as_str())
            .chain(config.classifier.untracked_variants.iter().map(String::as_str));

        Self::new(
            ModelMatcher::new(VariantCatalog::new(keys), &config.classifier.accessory_keywords),
            PriceExtractor::new(),
        )
    }

    pub fn classify_model(&self, text: &str) -> Option<ProductVariant> {
        self.models.classify_model(text)
    }

    pub fn extract_price(&self, text: &str) -> Option<u64> {
        self.prices.extract_price(text)
    }

    pub fn classify(&self, raw: &RawListing, base_url: Option<&Url>) -> Classification {
        let title = match raw.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title,
            _ => return Classification::Miss(MissReason::NoTitle),
        };

        let variant = match self.models.match_text(title) {
            ModelMatch::Variant(variant) => variant,
            ModelMatch::Accessory(keyword) => {
                return Classification::Miss(MissReason::Accessory(keyword));
            }
            ModelMatch::Unknown => return Classification::Miss(MissReason::UnknownModel),
        };

        let price = raw
            .price
            .as_ref()
            .and_then(|price| self.prices.price_field(price))
            .or_else(|| self.prices.extract_price(title));

        let Some(price) = price else {
            return Classification::Miss(MissReason::NoPrice);
        };

        Classification::Tracked(ClassifiedListing {
            source: raw.source.clone(),
            id: raw.id.clone(),
            title: title.to_string(),
            variant,
            price,
            url: raw.url.as_deref().and_then(|u| resolve_url(u, base_url)),
            image: raw.images.iter().find(|i| !i.trim().is_empty()).cloned(),
        })
    }
}

fn resolve_url(url: &str, base_url: Option<&Url>) -> Option<Url> {
    match Url::parse(url) {
        Ok(absolute) => Some(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => base_url?.join(url).ok(),
        Err(_) => None,
    }
}
