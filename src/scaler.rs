use std::path::Path;

use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};

use crate::error::{PredictError, Result};
use crate::features::{EncodedFeatures, SCALED_COLUMNS};

const N: usize = EncodedFeatures::NUM_SCALED;

/// Pre-fit transform over the [`SCALED_COLUMNS`] subset.
pub trait Scaler: Send + Sync {
    fn transform(&self, columns: [f64; N]) -> Result<[f64; N]>;
}

/// Standardization parameters fit during training.
///
/// Stored as a JSON sidecar next to the model weights:
/// `{"columns": [...], "mean": [...], "scale": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: [f64; N], scale: [f64; N]) -> Self {
        Self {
            columns: SCALED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            mean: mean.to_vec(),
            scale: scale.to_vec(),
        }
    }

    /// Load and check that the stats were fit on exactly the expected
    /// columns, in order.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scaler at {}", path.display()))?;
        let scaler: StandardScaler = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse scaler {}", path.display()))?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.columns != SCALED_COLUMNS {
            bail!(
                "scaler columns {:?} do not match expected {:?}",
                self.columns,
                SCALED_COLUMNS
            );
        }
        ensure!(
            self.mean.len() == N,
            "scaler mean has {} elements, expected {N}",
            self.mean.len()
        );
        ensure!(
            self.scale.len() == N,
            "scaler scale has {} elements, expected {N}",
            self.scale.len()
        );
        ensure!(
            self.mean.iter().chain(&self.scale).all(|v| v.is_finite()),
            "scaler stats must be finite"
        );
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, columns: [f64; N]) -> Result<[f64; N]> {
        if self.mean.len() != N || self.scale.len() != N {
            return Err(PredictError::Artifact(format!(
                "scaler fit on {} columns, got {N}",
                self.mean.len()
            )));
        }
        let mut out = [0.0; N];
        for i in 0..N {
            // constant column at fit time
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            out[i] = (columns[i] - self.mean[i]) / scale;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform() {
        let s = StandardScaler::new([2014.0, 7.5, 36_000.0, 4.0], [2.5, 8.0, 38_000.0, 0.0]);
        let out = s.transform([2019.0, 7.5, 74_000.0, 5.5]).unwrap();
        assert!((out[0] - 2.0).abs() < 1e-12);
        assert!(out[1].abs() < 1e-12);
        assert!((out[2] - 1.0).abs() < 1e-12);
        // zero scale is treated as 1
        assert!((out[3] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_save_load() {
        let s = StandardScaler::new([1.0; 4], [2.0; 4]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        std::fs::write(&path, serde_json::to_string_pretty(&s).unwrap()).unwrap();
        let loaded = StandardScaler::load(&path).unwrap();
        assert_eq!(loaded.mean, s.mean);
        assert_eq!(loaded.scale, s.scale);
    }

    #[test]
    fn test_load_rejects_wrong_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        std::fs::write(
            &path,
            r#"{"columns": ["Present_Price", "Year", "Kms_Driven", "Brand"],
                "mean": [0, 0, 0, 0], "scale": [1, 1, 1, 1]}"#,
        )
        .unwrap();
        let err = StandardScaler::load(&path).unwrap_err();
        assert!(err.to_string().contains("do not match"), "{err}");
    }

    #[test]
    fn test_load_rejects_short_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        std::fs::write(
            &path,
            r#"{"columns": ["Year", "Present_Price", "Kms_Driven", "Brand"],
                "mean": [0, 0, 0], "scale": [1, 1, 1, 1]}"#,
        )
        .unwrap();
        assert!(StandardScaler::load(&path).is_err());
    }
}
