use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical key of a tracked phone configuration, e.g. `iphone 14 pro max`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProductVariant(String);

impl ProductVariant {
    /// Keys are stored lower-cased with single spaces so they can be matched
    /// directly against normalized listing text.
    pub fn new(key: &str) -> Self {
        ProductVariant(normalize_text(key))
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-case and collapse all whitespace runs into single spaces.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The finite set of variants the classifier recognises, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct VariantCatalog {
    variants: Vec<ProductVariant>,
    // Indices into `variants`, longest key first, ties in catalog order.
    match_order: Vec<usize>,
}

impl VariantCatalog {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut variants: Vec<ProductVariant> = Vec::new();
        for key in keys {
            let variant = ProductVariant::new(key.as_ref());
            if !variant.key().is_empty() && !variants.contains(&variant) {
                variants.push(variant);
            }
        }

        let mut match_order: Vec<usize> = (0..variants.len()).collect();
        // Stable sort keeps catalog order among keys of equal length.
        match_order.sort_by(|a, b| variants[*b].key().len().cmp(&variants[*a].key().len()));

        Self {
            variants,
            match_order,
        }
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Variants in the order they must be tried against listing text.
    pub fn by_match_priority(&self) -> impl Iterator<Item = &ProductVariant> {
        self.match_order.iter().map(|index| &self.variants[*index])
    }
}
