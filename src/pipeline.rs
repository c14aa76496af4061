//! Request-scoped price estimation:
//! encode → assemble → scale → predict → post-process.
//!
//! Holds no mutable state, so one [`PricePipeline`] can serve any number of
//! concurrent requests.

use std::collections::HashMap;

use crate::artifacts::ModelBundle;
use crate::error::Result;
use crate::features::{EncodedFeatures, ScaledFeatures};
use crate::postprocess;
use crate::types::{Outcome, PredictionResult, VehicleInput};

pub struct PricePipeline {
    bundle: ModelBundle,
}

impl PricePipeline {
    pub fn new(bundle: ModelBundle) -> Self {
        Self { bundle }
    }

    /// Categorical codes come from `input`; the brand goes through the
    /// encoder artifact.
    pub fn encode(&self, input: &VehicleInput) -> Result<EncodedFeatures> {
        let brand_score = self.bundle.brand_encoder.encode(&input.brand)?;
        Ok(EncodedFeatures::assemble(input, brand_score))
    }

    pub fn scale(&self, encoded: &EncodedFeatures) -> Result<ScaledFeatures> {
        let scaled = self.bundle.scaler.transform(encoded.scaled_subset())?;
        Ok(ScaledFeatures::from_scaled_subset(encoded, scaled))
    }

    pub fn run(&self, input: &VehicleInput) -> Result<PredictionResult> {
        let encoded = self.encode(input)?;
        let scaled = self.scale(&encoded)?;
        let raw = self.bundle.regressor.predict(&scaled)?;
        Ok(postprocess::finalize(input.listed_price, raw))
    }

    /// Parse raw form fields and run the full chain.
    pub fn run_fields(&self, fields: &HashMap<String, String>) -> Result<PredictionResult> {
        let input = VehicleInput::from_fields(fields)?;
        self.run(&input)
    }

    /// Like [`run_fields`](Self::run_fields), with every failure collapsed
    /// into [`Outcome::Invalid`].
    pub fn estimate(&self, fields: &HashMap<String, String>) -> Outcome {
        self.run_fields(fields)
            .map(Outcome::from)
            .unwrap_or(Outcome::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::BrandEncoder;
    use crate::error::PredictError;
    use crate::model::Regressor;
    use crate::scaler::{Scaler, StandardScaler};
    use crate::types::Confidence;

    struct FixedModel(f64);

    impl Regressor for FixedModel {
        fn predict(&self, _: &ScaledFeatures) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct ConstBrand(f64);

    impl BrandEncoder for ConstBrand {
        fn encode(&self, _: &str) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct BrokenScaler;

    impl Scaler for BrokenScaler {
        fn transform(&self, _: [f64; 4]) -> Result<[f64; 4]> {
            Err(PredictError::Artifact("shape mismatch".into()))
        }
    }

    fn pipeline(raw: f64) -> PricePipeline {
        PricePipeline::new(ModelBundle::new(
            Box::new(FixedModel(raw)),
            Box::new(StandardScaler::new([2014.0, 7.0, 40_000.0, 4.0], [3.0, 8.0, 40_000.0, 1.0])),
            Box::new(ConstBrand(5.0)),
        ))
    }

    fn fields(listed: &str) -> HashMap<String, String> {
        [
            ("Year", "2015"),
            ("Present_Price", listed),
            ("Kms_Driven", "30000"),
            ("Owner", "0"),
            ("Fuel_Type", "Petrol"),
            ("Seller_Type", "Dealer"),
            ("Transmission", "Manual"),
            ("Brand", "toyota"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_scale_only_touches_subset() {
        let p = pipeline(3.0);
        let input = VehicleInput::from_fields(&fields("5.5")).unwrap();
        let encoded = p.encode(&input).unwrap();
        let scaled = p.scale(&encoded).unwrap();
        let s = scaled.columns();
        assert!((s.year - 1.0 / 3.0).abs() < 1e-12);
        assert!((s.present_price + 0.1875).abs() < 1e-12);
        assert!((s.kms_driven + 0.25).abs() < 1e-12);
        assert!((s.brand - 1.0).abs() < 1e-12);
        assert_eq!(s.owner.to_bits(), encoded.owner.to_bits());
        assert_eq!(s.fuel_type.to_bits(), encoded.fuel_type.to_bits());
        assert_eq!(s.seller_type.to_bits(), encoded.seller_type.to_bits());
        assert_eq!(s.transmission.to_bits(), encoded.transmission.to_bits());
    }

    #[test]
    fn test_run_clamps_and_tiers() {
        let r = pipeline(5.123).run_fields(&fields("5.5")).unwrap();
        assert_eq!(r.clamped_price, 5.12);
        assert_eq!(r.confidence, Confidence::Close);
    }

    #[test]
    fn test_artifact_failure_is_fatal() {
        let p = PricePipeline::new(ModelBundle::new(
            Box::new(FixedModel(3.0)),
            Box::new(BrokenScaler),
            Box::new(ConstBrand(5.0)),
        ));
        assert!(matches!(p.run_fields(&fields("5.5")), Err(PredictError::Artifact(_))));
        assert_eq!(p.estimate(&fields("5.5")), Outcome::Invalid);
    }

    #[test]
    fn test_estimate_sentinel_on_bad_input() {
        let out = pipeline(3.0).estimate(&fields("abc"));
        assert_eq!(out, Outcome::Invalid);
        assert_eq!(out.confidence(), 0);
        assert_eq!(out.price(), None);
    }
}
