use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::PricingConfig;
use crate::models::ProductVariant;

/// Resale economics for one variant, with the two buy thresholds derived from it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceTargets {
    pub resell_value: u64,
    pub part_cost: u64,
    pub battery_cost: u64,
    pub target_aggressive: u64,
    pub target_acceptable: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VariantPrice {
    resell_value: u64,
    part_cost: u64,
}

/// Static price tables, built once from configuration.
#[derive(Debug, Clone)]
pub struct PriceModel {
    prices: HashMap<ProductVariant, VariantPrice>,
    battery_cost: u64,
    large_margin: u64,
    small_margin: u64,
}

impl PriceModel {
    pub fn new(battery_cost: u64, large_margin: u64, small_margin: u64) -> Self {
        Self {
            prices: HashMap::new(),
            battery_cost,
            large_margin,
            small_margin,
        }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        let mut model = Self::new(config.battery_cost, config.large_margin, config.small_margin);
        for entry in &config.variants {
            model = model.with_variant(&entry.key, entry.resell, entry.part_cost);
        }
        model
    }

    pub fn with_variant(mut self, key: &str, resell_value: u64, part_cost: u64) -> Self {
        self.prices.insert(
            ProductVariant::new(key),
            VariantPrice {
                resell_value,
                part_cost,
            },
        );
        self
    }

    pub fn is_tracked(&self, variant: &ProductVariant) -> bool {
        self.prices.contains_key(variant)
    }

    /// Targets for a variant, or `None` when it has no price entry.
    pub fn targets(&self, variant: &ProductVariant) -> Option<PriceTargets> {
        let price = self.prices.get(variant)?;
        let repair_cost = price.part_cost + self.battery_cost;

        Some(PriceTargets {
            resell_value: price.resell_value,
            part_cost: price.part_cost,
            battery_cost: self.battery_cost,
            target_aggressive: price
                .resell_value
                .saturating_sub(self.large_margin)
                .saturating_sub(repair_cost),
            target_acceptable: price
                .resell_value
                .saturating_sub(self.small_margin)
                .saturating_sub(repair_cost),
        })
    }
}
