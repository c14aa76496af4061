//! Feature assembly in the column order the model artifacts were fit on.

use crate::encoding::Categorical;
use crate::types::VehicleInput;

pub const YEAR: &str = "Year";
pub const PRESENT_PRICE: &str = "Present_Price";
pub const KMS_DRIVEN: &str = "Kms_Driven";
pub const OWNER: &str = "Owner";
pub const FUEL_TYPE: &str = "Fuel_Type";
pub const SELLER_TYPE: &str = "Seller_Type";
pub const TRANSMISSION: &str = "Transmission";
pub const BRAND: &str = "Brand";

/// Model input order. Changing it changes what the model sees without any
/// error, so artifacts are checked against it at load time.
pub const COLUMNS: [&str; EncodedFeatures::NUM_FEATURES] = [
    YEAR,
    PRESENT_PRICE,
    KMS_DRIVEN,
    OWNER,
    FUEL_TYPE,
    SELLER_TYPE,
    TRANSMISSION,
    BRAND,
];

/// Columns the scaler was fit on, in its order.
pub const SCALED_COLUMNS: [&str; EncodedFeatures::NUM_SCALED] =
    [YEAR, PRESENT_PRICE, KMS_DRIVEN, BRAND];

/// One encoded row, before scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedFeatures {
    pub year: f64,
    pub present_price: f64,
    pub kms_driven: f64,
    pub owner: f64,
    pub fuel_type: f64,
    pub seller_type: f64,
    pub transmission: f64,
    pub brand: f64,
}

impl EncodedFeatures {
    pub const NUM_FEATURES: usize = 8;
    pub const NUM_SCALED: usize = 4;

    /// Build the row from a parsed input and its brand score.
    pub fn assemble(input: &VehicleInput, brand_score: f64) -> Self {
        Self {
            year: f64::from(input.year),
            present_price: input.listed_price,
            kms_driven: input.kms_driven as f64,
            owner: f64::from(input.owner_count),
            fuel_type: f64::from(input.fuel_type.code()),
            seller_type: f64::from(input.seller_type.code()),
            transmission: f64::from(input.transmission.code()),
            brand: brand_score,
        }
    }

    /// Row in [`COLUMNS`] order.
    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        [
            self.year,
            self.present_price,
            self.kms_driven,
            self.owner,
            self.fuel_type,
            self.seller_type,
            self.transmission,
            self.brand,
        ]
    }

    /// The scaler's input, in [`SCALED_COLUMNS`] order.
    pub fn scaled_subset(&self) -> [f64; Self::NUM_SCALED] {
        [self.year, self.present_price, self.kms_driven, self.brand]
    }
}

/// A row whose [`SCALED_COLUMNS`] went through the scaler.
///
/// Only constructible from an [`EncodedFeatures`] plus the scaled subset, so
/// the unscaled columns always pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledFeatures(EncodedFeatures);

impl ScaledFeatures {
    pub fn from_scaled_subset(
        encoded: &EncodedFeatures,
        scaled: [f64; EncodedFeatures::NUM_SCALED],
    ) -> Self {
        let [year, present_price, kms_driven, brand] = scaled;
        Self(EncodedFeatures {
            year,
            present_price,
            kms_driven,
            brand,
            ..*encoded
        })
    }

    /// All-zero row, used for the startup warmup pass.
    pub fn zeros() -> Self {
        Self(EncodedFeatures {
            year: 0.0,
            present_price: 0.0,
            kms_driven: 0.0,
            owner: 0.0,
            fuel_type: 0.0,
            seller_type: 0.0,
            transmission: 0.0,
            brand: 0.0,
        })
    }

    pub fn columns(&self) -> &EncodedFeatures {
        &self.0
    }

    pub fn to_array(&self) -> [f64; EncodedFeatures::NUM_FEATURES] {
        self.0.to_array()
    }
}
