use crate::models::{ProductVariant, VariantCatalog, normalize_text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelMatch {
    Variant(ProductVariant),
    /// Text names an accessory, whatever phone it also mentions.
    Accessory(String),
    Unknown,
}

/// Maps free listing text onto the variant catalog.
pub struct ModelMatcher {
    catalog: VariantCatalog,
    accessory_keywords: Vec<String>,
}

impl ModelMatcher {
    pub fn new<S: AsRef<str>>(catalog: VariantCatalog, accessory_keywords: &[S]) -> Self {
        let accessory_keywords = accessory_keywords
            .iter()
            .map(|k| normalize_text(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            catalog,
            accessory_keywords,
        }
    }

    pub fn match_text(&self, text: &str) -> ModelMatch {
        let normalized = normalize_text(text);

        if let Some(keyword) = self
            .accessory_keywords
            .iter()
            .find(|keyword| normalized.contains(keyword.as_str()))
        {
            return ModelMatch::Accessory(keyword.clone());
        }

        self.catalog
            .by_match_priority()
            .find(|variant| normalized.contains(variant.key()))
            .map(|variant| ModelMatch::Variant(variant.clone()))
            .unwrap_or(ModelMatch::Unknown)
    }

    pub fn classify_model(&self, text: &str) -> Option<ProductVariant> {
        match self.match_text(text) {
            ModelMatch::Variant(variant) => Some(variant),
            _ => None,
        }
    }
}
