use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::ProductVariant;

/// Price as the source provided it: a structured amount or display text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RawPrice {
    Amount(Decimal),
    Text(String),
}

/// A listing exactly as one source returned it, before any interpretation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawListing {
    pub source: String,
    pub id: String,
    pub title: Option<String>,
    pub price: Option<RawPrice>,
    pub url: Option<String>,
    pub images: Vec<String>,
}

impl RawListing {
    pub fn new(source: &str, id: impl Into<String>) -> Self {
        Self {
            source: source.to_string(),
            id: id.into(),
            title: None,
            price: None,
            url: None,
            images: Vec::new(),
        }
    }

    /// Composite key used by the seen store.
    pub fn seen_key(&self) -> String {
        format!("{}:{}", self.source, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedListing {
    pub source: String,
    pub id: String,
    pub title: String,
    pub variant: ProductVariant,
    pub price: u64,
    pub url: Option<Url>,
    pub image: Option<String>,
}

impl ClassifiedListing {
    pub fn seen_key(&self) -> String {
        format!("{}:{}", self.source, self.id)
    }
}
