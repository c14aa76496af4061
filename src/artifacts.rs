//! One-time loading of the three fitted artifacts.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::encoding::{BrandEncoder, TargetEncoder};
use crate::features::ScaledFeatures;
use crate::model::{load_regressor, Regressor};
use crate::scaler::{Scaler, StandardScaler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub encoder: PathBuf,
}

impl ArtifactPaths {
    /// Conventional file names inside one directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join("reg_model.json"),
            scaler: dir.join("scaler.json"),
            encoder: dir.join("target_encode.json"),
        }
    }
}

/// Immutable handles to the fitted model, scaler and brand encoder.
///
/// Built once before serving and shared read-only afterwards.
pub struct ModelBundle {
    pub regressor: Box<dyn Regressor>,
    pub scaler: Box<dyn Scaler>,
    pub brand_encoder: Box<dyn BrandEncoder>,
}

impl ModelBundle {
    pub fn new(
        regressor: Box<dyn Regressor>,
        scaler: Box<dyn Scaler>,
        brand_encoder: Box<dyn BrandEncoder>,
    ) -> Self {
        Self {
            regressor,
            scaler,
            brand_encoder,
        }
    }

    /// Load all three artifacts and run a warmup forward pass. Any failure
    /// here must stop startup.
    pub fn load(paths: &ArtifactPaths) -> anyhow::Result<Self> {
        let regressor = load_regressor(&paths.model)?;
        tracing::info!(path = %paths.model.display(), "loaded regression model");

        let scaler = StandardScaler::load(&paths.scaler)?;
        tracing::info!(path = %paths.scaler.display(), "loaded scaler");

        let encoder = TargetEncoder::load(&paths.encoder)?;
        tracing::info!(
            path = %paths.encoder.display(),
            brands = encoder.len(),
            "loaded brand encoder"
        );

        let bundle = Self::new(regressor, Box::new(scaler), Box::new(encoder));
        bundle.warmup()?;
        Ok(bundle)
    }

    pub fn warmup(&self) -> anyhow::Result<()> {
        let y = self
            .regressor
            .predict(&ScaledFeatures::zeros())
            .context("warmup forward failed")?;
        tracing::info!(raw = y, "warmup forward ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelBundle::load(&ArtifactPaths::in_dir(dir.path())).err().unwrap();
        assert!(err.to_string().contains("failed to read model"), "{err}");
    }

    #[test]
    fn test_in_dir_names() {
        let p = ArtifactPaths::in_dir(Path::new("/srv/models"));
        assert_eq!(p.model, Path::new("/srv/models/reg_model.json"));
        assert_eq!(p.scaler, Path::new("/srv/models/scaler.json"));
        assert_eq!(p.encoder, Path::new("/srv/models/target_encode.json"));
    }
}
