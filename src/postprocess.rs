//! Turns an unconstrained model output into a user-facing price and a
//! confidence tier.
//!
//! The tier is a heuristic on how far the estimate lands from the listed
//! price, not a statistical interval.

use crate::types::{Confidence, PredictionResult};

/// Floor for any reported price (0.5 lakh = 50,000 INR).
pub const MIN_PRICE: f64 = 0.5;
/// Ceiling for any reported price (50 lakh).
pub const MAX_PRICE: f64 = 50.0;

/// Estimates at or below this always get [`Confidence::LowPrice`].
pub const LOW_PRICE_CUTOFF: f64 = 1.0;

/// Deviation tiers, checked in order; first match wins.
const DEVIATION_TIERS: [(f64, Confidence); 3] = [
    (1.0, Confidence::Close),
    (2.0, Confidence::Good),
    (3.0, Confidence::Fair),
];

/// Clamp into `[MIN_PRICE, MAX_PRICE]` and round to 2 decimals. NaN maps to
/// the floor.
pub fn clamp_price(raw: f64) -> f64 {
    if raw.is_nan() {
        return MIN_PRICE;
    }
    round_cents(raw.clamp(MIN_PRICE, MAX_PRICE))
}

/// Round the exact stored value to 2 decimals, ties to even.
///
/// Scaling by 100 first would round `1.115` (stored just below) up to 1.12.
fn round_cents(v: f64) -> f64 {
    format!("{v:.2}").parse().unwrap_or(v)
}

/// Tier for an already clamped price.
pub fn confidence(listed_price: f64, clamped_price: f64) -> Confidence {
    if clamped_price <= LOW_PRICE_CUTOFF {
        return Confidence::LowPrice;
    }
    let deviation = (listed_price - clamped_price).abs();
    DEVIATION_TIERS
        .iter()
        .find(|(limit, _)| deviation < *limit)
        .map(|(_, tier)| *tier)
        .unwrap_or(Confidence::Wide)
}

pub fn finalize(listed_price: f64, raw_price: f64) -> PredictionResult {
    let clamped_price = clamp_price(raw_price);
    PredictionResult {
        raw_price,
        clamped_price,
        confidence: confidence(listed_price, clamped_price),
    }
}
