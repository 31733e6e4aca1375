use crate::config::DebugConfig;
use crate::models::{Alert, ClassifiedListing, Tier};
use crate::pricing::PriceModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Untracked,
    AboveTarget { price: u64, target_acceptable: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Alert(Alert),
    Reject(RejectReason),
}

/// Decides which classified listings are worth an alert.
pub struct Scorer {
    prices: PriceModel,
    debug_enabled: bool,
    debug_cap: u32,
    // Process lifetime, not per pass.
    debug_sent: u32,
}

impl Scorer {
    pub fn new(prices: PriceModel) -> Self {
        Self {
            prices,
            debug_enabled: false,
            debug_cap: 0,
            debug_sent: 0,
        }
    }

    pub fn with_debug(mut self, config: &DebugConfig) -> Self {
        self.debug_enabled = config.enabled;
        self.debug_cap = config.max_sends;
        self
    }

    pub fn debug_sent(&self) -> u32 {
        self.debug_sent
    }

    pub fn score(&mut self, listing: &ClassifiedListing) -> Verdict {
        let targets = self.prices.targets(&listing.variant);

        let rejection = match targets {
            None => RejectReason::Untracked,
            Some(t) if listing.price > t.target_acceptable => RejectReason::AboveTarget {
                price: listing.price,
                target_acceptable: t.target_acceptable,
            },
            Some(t) => {
                let tier = if listing.price <= t.target_aggressive {
                    Tier::Aggressive
                } else {
                    Tier::Acceptable
                };
                return Verdict::Alert(Alert::new(listing, tier, Some(t)));
            }
        };

        if self.debug_enabled && self.debug_sent < self.debug_cap {
            self.debug_sent += 1;
            tracing::debug!(
                listing = %listing.seen_key(),
                sent = self.debug_sent,
                cap = self.debug_cap,
                "Debug override of rejected listing"
            );
            return Verdict::Alert(Alert::new(listing, Tier::Debug, targets));
        }

        Verdict::Reject(rejection)
    }
}
