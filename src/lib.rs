//! Used-car resale price estimation from a pre-trained regression model.
//!
//! The fitted artifacts (model, scaler, brand target-encoder) are loaded once
//! into a [`ModelBundle`]; a [`PricePipeline`] then turns form fields into a
//! clamped price and a confidence tier.

pub mod artifacts;
pub mod config;
pub mod encoding;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod scaler;
pub mod server;
pub mod types;

pub use artifacts::{ArtifactPaths, ModelBundle};
pub use error::PredictError;
pub use pipeline::PricePipeline;
pub use types::{Confidence, Outcome, PredictionResult, VehicleInput};
