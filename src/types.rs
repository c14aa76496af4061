use std::collections::HashMap;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::encoding::{normalize_brand, Categorical, FuelType, SellerType, Transmission};
use crate::error::{PredictError, Result};
use crate::features::{BRAND, KMS_DRIVEN, OWNER, PRESENT_PRICE, YEAR};

/// Label shown in place of a price when a request fails.
pub const INVALID_INPUT: &str = "Invalid Input";

/// One parsed vehicle description. Brand is already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleInput {
    pub year: i32,
    /// Current showroom price, in lakhs.
    pub listed_price: f64,
    pub kms_driven: u64,
    pub owner_count: u32,
    pub fuel_type: FuelType,
    pub seller_type: SellerType,
    pub transmission: Transmission,
    pub brand: String,
}

impl VehicleInput {
    /// Parse a flat map of form fields. Any missing or malformed field fails
    /// the whole input.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self> {
        let year = parse_number::<i32>(fields, YEAR)?;
        let listed_price = parse_number::<f64>(fields, PRESENT_PRICE)?;
        if !listed_price.is_finite() || listed_price <= 0.0 {
            return Err(PredictError::parse(PRESENT_PRICE, "must be a positive number"));
        }
        let kms_driven = parse_number::<u64>(fields, KMS_DRIVEN)?;
        let owner_count = parse_number::<u32>(fields, OWNER)?;

        let fuel_type = FuelType::parse(required(fields, FuelType::FIELD)?)?;
        let seller_type = SellerType::parse(required(fields, SellerType::FIELD)?)?;
        let transmission = Transmission::parse(required(fields, Transmission::FIELD)?)?;

        let brand = normalize_brand(required(fields, BRAND)?);
        if brand.is_empty() {
            return Err(PredictError::parse(BRAND, "empty"));
        }

        Ok(Self {
            year,
            listed_price,
            kms_driven,
            owner_count,
            fuel_type,
            seller_type,
            transmission,
            brand,
        })
    }
}

fn required<'a>(fields: &'a HashMap<String, String>, field: &'static str) -> Result<&'a str> {
    fields
        .get(field)
        .map(String::as_str)
        .ok_or_else(|| PredictError::parse(field, "missing"))
}

fn parse_number<T>(fields: &HashMap<String, String>, field: &'static str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = required(fields, field)?.trim();
    if raw.is_empty() {
        return Err(PredictError::parse(field, "empty"));
    }
    raw.parse::<T>()
        .map_err(|e| PredictError::parse(field, format!("{raw:?}: {e}")))
}

/// Heuristic trust tier attached to a clamped price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    Wide,
    Fair,
    LowPrice,
    Good,
    Close,
}

impl Confidence {
    pub fn percent(self) -> u8 {
        match self {
            Confidence::Wide => 65,
            Confidence::LowPrice => 70,
            Confidence::Fair => 75,
            Confidence::Good => 85,
            Confidence::Close => 92,
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u8(self.percent())
    }
}

/// Per-request result; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub raw_price: f64,
    pub clamped_price: f64,
    pub confidence: Confidence,
}

/// What the presentation layer sees: a price with its tier, or the
/// `("Invalid Input", 0)` sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Priced { price: f64, confidence: Confidence },
    Invalid,
}

impl Outcome {
    /// `0` is reserved for failures.
    pub fn confidence(&self) -> u8 {
        match self {
            Outcome::Priced { confidence, .. } => confidence.percent(),
            Outcome::Invalid => 0,
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            Outcome::Priced { price, .. } => Some(*price),
            Outcome::Invalid => None,
        }
    }
}

impl From<PredictionResult> for Outcome {
    fn from(r: PredictionResult) -> Self {
        Outcome::Priced {
            price: r.clamped_price,
            confidence: r.confidence,
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("Outcome", 2)?;
        match self {
            Outcome::Priced { price, .. } => st.serialize_field("prediction", price)?,
            Outcome::Invalid => st.serialize_field("prediction", INVALID_INPUT)?,
        }
        st.serialize_field("confidence", &self.confidence())?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn valid() -> HashMap<String, String> {
        fields(&[
            ("Year", "2015"),
            ("Present_Price", "5.5"),
            ("Kms_Driven", "30000"),
            ("Owner", "0"),
            ("Fuel_Type", "Petrol"),
            ("Seller_Type", "Dealer"),
            ("Transmission", "Manual"),
            ("Brand", "toyota"),
        ])
    }

    #[test]
    fn test_parse_valid() {
        let input = VehicleInput::from_fields(&valid()).unwrap();
        assert_eq!(input.year, 2015);
        assert_eq!(input.listed_price, 5.5);
        assert_eq!(input.kms_driven, 30_000);
        assert_eq!(input.owner_count, 0);
        assert_eq!(input.fuel_type, FuelType::Petrol);
        assert_eq!(input.seller_type, SellerType::Dealer);
        assert_eq!(input.transmission, Transmission::Manual);
        assert_eq!(input.brand, "Toyota");
    }

    #[test]
    fn test_numeric_fields_are_trimmed() {
        let mut f = valid();
        f.insert("Year".into(), " 2018 ".into());
        assert_eq!(VehicleInput::from_fields(&f).unwrap().year, 2018);
    }

    #[test]
    fn test_missing_field() {
        let mut f = valid();
        f.remove("Owner");
        let err = VehicleInput::from_fields(&f).unwrap_err();
        assert!(matches!(err, PredictError::Parse { field: "Owner", .. }));
    }

    #[test]
    fn test_unparseable_numbers() {
        for (field, bad) in [
            ("Year", "twenty"),
            ("Present_Price", ""),
            ("Present_Price", "-1.0"),
            ("Present_Price", "NaN"),
            ("Kms_Driven", "30000.5"),
            ("Kms_Driven", "-5"),
            ("Owner", "x"),
        ] {
            let mut f = valid();
            f.insert(field.into(), bad.into());
            let err = VehicleInput::from_fields(&f).unwrap_err();
            assert!(
                matches!(err, PredictError::Parse { field: got, .. } if got == field),
                "{field}={bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_invalid_category() {
        let mut f = valid();
        f.insert("Fuel_Type".into(), "Hybrid".into());
        assert!(matches!(
            VehicleInput::from_fields(&f),
            Err(PredictError::InvalidCategory { field: "Fuel_Type", .. })
        ));
    }

    #[test]
    fn test_blank_brand() {
        let mut f = valid();
        f.insert("Brand".into(), "   ".into());
        assert!(matches!(
            VehicleInput::from_fields(&f),
            Err(PredictError::Parse { field: "Brand", .. })
        ));
    }

    #[test]
    fn test_outcome_json() {
        let ok = Outcome::Priced {
            price: 4.37,
            confidence: Confidence::Good,
        };
        assert_eq!(
            serde_json::to_value(ok).unwrap(),
            serde_json::json!({"prediction": 4.37, "confidence": 85})
        );
        assert_eq!(
            serde_json::to_value(Outcome::Invalid).unwrap(),
            serde_json::json!({"prediction": "Invalid Input", "confidence": 0})
        );
    }

    #[test]
    fn test_confidence_values() {
        let mut got: Vec<u8> = [
            Confidence::Wide,
            Confidence::Fair,
            Confidence::LowPrice,
            Confidence::Good,
            Confidence::Close,
        ]
        .iter()
        .map(|c| c.percent())
        .collect();
        got.sort_unstable();
        assert_eq!(got, vec![65, 70, 75, 85, 92]);
    }
}
