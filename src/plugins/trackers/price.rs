use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

use crate::models::RawPrice;

// Integer part with optional thousands groups (dot or no-break spaces), then an
// optional 1-2 digit fraction after a dot or comma.
const AMOUNT: &str = r"\d+(?:[.\u{00A0}\u{202F}]\d{3})*(?:[.,]\d{1,2})?";

// Inside a dedicated price field a plain space is also a thousands separator.
const FIELD_AMOUNT: &str = r"\d{1,3}(?:[ \u{00A0}\u{202F}]\d{3})+(?:[.,]\d{1,2})?";

/// Extracts whole-euro prices from listing text.
pub struct PriceExtractor {
    price_regex: Regex,
    field_regex: Regex,
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceExtractor {
    pub fn new() -> Self {
        let currency_after = format!(r"(?P<after>{AMOUNT})\s*(?:€|(?i:eur(?:os?)?)\b)");
        let currency_before = format!(r"(?:€|(?i:eur)\b)\s*(?P<before>{AMOUNT})");

        PriceExtractor {
            price_regex: Regex::new(&format!("{currency_after}|{currency_before}"))
                .expect("price pattern is valid"),
            field_regex: Regex::new(&format!(
                r"^\s*(?:€|(?i:eur)\b)?\s*(?P<field>{FIELD_AMOUNT}|{AMOUNT})\s*(?:€|(?i:eur(?:os?)?)\b)?\s*$"
            ))
            .expect("field price pattern is valid"),
        }
    }

    /// First currency-marked amount in `text`, truncated to whole euros.
    ///
    /// Only the first match is used: a listing quoting a crossed-out original
    /// price before the asking price yields the original price.
    pub fn extract_price(&self, text: &str) -> Option<u64> {
        let captures = self.price_regex.captures(text)?;
        let amount = captures
            .name("after")
            .or_else(|| captures.name("before"))?
            .as_str();
        parse_amount(amount)
    }

    /// Price from a dedicated price field. A bare number is accepted there
    /// because the field itself implies the currency, and so is plain-space
    /// grouping since the field holds nothing but the price.
    pub fn price_field(&self, price: &RawPrice) -> Option<u64> {
        match price {
            RawPrice::Amount(amount) => {
                if amount.is_sign_negative() {
                    None
                } else {
                    amount.trunc().to_u64()
                }
            }
            RawPrice::Text(text) => match self.field_regex.captures(text) {
                Some(captures) => parse_amount(captures.name("field")?.as_str()),
                None => self.extract_price(text),
            },
        }
    }
}

fn parse_amount(amount: &str) -> Option<u64> {
    let (integer, fraction) = split_fraction(amount);
    let digits: String = integer.chars().filter(|c| c.is_ascii_digit()).collect();

    let normalized = match fraction {
        Some(fraction) => format!("{}.{}", digits, fraction),
        None => digits,
    };

    Decimal::from_str(&normalized)
        .ok()
        .and_then(|price| price.trunc().to_u64())
        .or_else(|| normalized.split('.').next()?.parse::<u64>().ok())
}

// A trailing separator followed by one or two digits is the decimal part;
// three digits after a separator is a thousands group.
fn split_fraction(amount: &str) -> (&str, Option<&str>) {
    if let Some(pos) = amount.rfind(['.', ',']) {
        let tail = &amount[pos + 1..];
        if !tail.is_empty() && tail.len() <= 2 {
            return (&amount[..pos], Some(tail));
        }
    }
    (amount, None)
}
