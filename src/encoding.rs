//! Input encoding: closed categorical fields to fixed integer codes, and the
//! free-text brand to its target-encoded score.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{ensure, Context};
use serde::Deserialize;

use crate::error::{PredictError, Result};
use crate::features::{FUEL_TYPE, SELLER_TYPE, TRANSMISSION};

/// A field with a closed set of accepted labels, each with a fixed code.
pub trait Categorical: Sized + Copy + 'static {
    /// Form field name, also used in error messages.
    const FIELD: &'static str;
    /// Accepted labels in code order.
    const LABELS: &'static [(&'static str, Self)];

    fn code(self) -> u8;

    /// Exact, case-sensitive lookup. No fallback code.
    fn parse(value: &str) -> Result<Self> {
        Self::LABELS
            .iter()
            .find(|(label, _)| *label == value)
            .map(|(_, v)| *v)
            .ok_or_else(|| PredictError::InvalidCategory {
                field: Self::FIELD,
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelType {
    Petrol,
    Diesel,
    Cng,
}

impl Categorical for FuelType {
    const FIELD: &'static str = FUEL_TYPE;
    const LABELS: &'static [(&'static str, Self)] = &[
        ("Petrol", FuelType::Petrol),
        ("Diesel", FuelType::Diesel),
        ("CNG", FuelType::Cng),
    ];

    fn code(self) -> u8 {
        match self {
            FuelType::Petrol => 0,
            FuelType::Diesel => 1,
            FuelType::Cng => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerType {
    Individual,
    Dealer,
}

impl Categorical for SellerType {
    const FIELD: &'static str = SELLER_TYPE;
    const LABELS: &'static [(&'static str, Self)] = &[
        ("Individual", SellerType::Individual),
        ("Dealer", SellerType::Dealer),
    ];

    fn code(self) -> u8 {
        match self {
            SellerType::Individual => 0,
            SellerType::Dealer => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transmission {
    Manual,
    Automatic,
}

impl Categorical for Transmission {
    const FIELD: &'static str = TRANSMISSION;
    const LABELS: &'static [(&'static str, Self)] = &[
        ("Manual", Transmission::Manual),
        ("Automatic", Transmission::Automatic),
    ];

    fn code(self) -> u8 {
        match self {
            Transmission::Manual => 0,
            Transmission::Automatic => 1,
        }
    }
}

/// Trim and title-case a brand: every alphabetic run starts in title case and
/// continues lower-case (`"mercedes-benz"` -> `"Mercedes-Benz"`).
pub fn normalize_brand(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_word = false;
    for c in raw.trim().chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                push_titlecase(&mut out, c);
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

// Titlecase differs from uppercase only for the Latin digraphs.
fn push_titlecase(out: &mut String, c: char) {
    match c {
        '\u{01C4}'..='\u{01C6}' => out.push('\u{01C5}'),
        '\u{01C7}'..='\u{01C9}' => out.push('\u{01C8}'),
        '\u{01CA}'..='\u{01CC}' => out.push('\u{01CB}'),
        '\u{01F1}'..='\u{01F3}' => out.push('\u{01F2}'),
        _ => out.extend(c.to_uppercase()),
    }
}

/// Maps a normalized brand to its numeric score.
///
/// Unseen brands are the implementation's business: the pipeline never
/// rejects a brand on its own.
pub trait BrandEncoder: Send + Sync {
    fn encode(&self, brand: &str) -> Result<f64>;
}

/// Pre-fit target-encoding table with the global-mean fallback baked in.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetEncoder {
    mapping: HashMap<String, f64>,
    default: f64,
}

impl TargetEncoder {
    pub fn new(mapping: HashMap<String, f64>, default: f64) -> Self {
        Self { mapping, default }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read brand encoder at {}", path.display()))?;
        let enc: TargetEncoder = serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse brand encoder {}", path.display()))?;
        ensure!(enc.default.is_finite(), "brand encoder default is not finite");
        if let Some((brand, _)) = enc.mapping.iter().find(|(_, v)| !v.is_finite()) {
            anyhow::bail!("brand encoder score for {brand:?} is not finite");
        }
        Ok(enc)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

impl BrandEncoder for TargetEncoder {
    fn encode(&self, brand: &str) -> Result<f64> {
        Ok(self.mapping.get(brand).copied().unwrap_or(self.default))
    }
}
