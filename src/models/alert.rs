use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::{ClassifiedListing, ProductVariant};
use crate::pricing::PriceTargets;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Aggressive,
    Acceptable,
    Debug,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Aggressive => "aggressive",
            Tier::Acceptable => "acceptable",
            Tier::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub source: String,
    pub listing_id: String,
    pub title: String,
    pub price: u64,
    pub variant: ProductVariant,
    pub targets: Option<PriceTargets>,
    pub tier: Tier,
    pub url: Option<Url>,
    pub image: Option<String>,
}

impl Alert {
    pub fn new(listing: &ClassifiedListing, tier: Tier, targets: Option<PriceTargets>) -> Self {
        Self {
            source: listing.source.clone(),
            listing_id: listing.id.clone(),
            title: listing.title.clone(),
            price: listing.price,
            variant: listing.variant.clone(),
            targets,
            tier,
            url: listing.url.clone(),
            image: listing.image.clone(),
        }
    }
}
