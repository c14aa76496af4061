use std::path::Path;

use anyhow::{bail, ensure, Context};
use serde::Deserialize;

use crate::error::{PredictError, Result};
use crate::features::{EncodedFeatures, ScaledFeatures, COLUMNS};

const N: usize = EncodedFeatures::NUM_FEATURES;

/// A fitted regression model: one scaled row in, one raw price out.
///
/// The output is unconstrained (negative or huge values are possible).
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &ScaledFeatures) -> Result<f64>;
}

/// On-disk JSON model, tagged by `kind`.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelJson {
    Linear {
        feature_names: Vec<String>,
        coef: Vec<f64>,
        intercept: f64,
    },
    Forest {
        feature_names: Vec<String>,
        trees: Vec<Tree>,
    },
}

fn check_feature_names(names: &[String]) -> anyhow::Result<()> {
    if names != COLUMNS {
        bail!(
            "model feature_names {:?} do not match expected {:?}",
            names,
            COLUMNS
        );
    }
    Ok(())
}

/// Load a regression artifact. `.pt` files are TorchScript (needs the
/// `torch` feature); anything else is read as a JSON model.
pub fn load_regressor(path: &Path) -> anyhow::Result<Box<dyn Regressor>> {
    if path.extension().is_some_and(|e| e == "pt") {
        return load_torchscript(path);
    }

    let txt = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read model at {}", path.display()))?;
    let model: ModelJson = serde_json::from_str(&txt)
        .with_context(|| format!("failed to parse model {}", path.display()))?;

    match model {
        ModelJson::Linear {
            feature_names,
            coef,
            intercept,
        } => {
            check_feature_names(&feature_names)?;
            let coef: [f64; N] = coef
                .try_into()
                .map_err(|c: Vec<f64>| anyhow::anyhow!("model has {} coefficients, expected {N}", c.len()))?;
            Ok(Box::new(LinearRegressor::new(coef, intercept)))
        }
        ModelJson::Forest {
            feature_names,
            trees,
        } => {
            check_feature_names(&feature_names)?;
            Ok(Box::new(ForestRegressor::new(trees)?))
        }
    }
}

#[cfg(feature = "torch")]
fn load_torchscript(path: &Path) -> anyhow::Result<Box<dyn Regressor>> {
    Ok(Box::new(torch::TorchRegressor::load(path)?))
}

#[cfg(not(feature = "torch"))]
fn load_torchscript(path: &Path) -> anyhow::Result<Box<dyn Regressor>> {
    bail!(
        "{} is a TorchScript model; rebuild with --features torch",
        path.display()
    )
}

/// Ordinary least squares: `intercept + coef · x`.
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    coef: [f64; N],
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coef: [f64; N], intercept: f64) -> Self {
        Self { coef, intercept }
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, features: &ScaledFeatures) -> Result<f64> {
        let x = features.to_array();
        Ok(self.intercept + self.coef.iter().zip(x).map(|(w, v)| w * v).sum::<f64>())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Flattened decision tree; node 0 is the root.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, idx: usize) -> anyhow::Result<()> {
        ensure!(!self.nodes.is_empty(), "tree {idx} has no nodes");
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                threshold,
            } = *node
            {
                ensure!(feature < N, "tree {idx} node {i}: feature {feature} out of range");
                ensure!(
                    left < self.nodes.len() && right < self.nodes.len(),
                    "tree {idx} node {i}: child out of range"
                );
                // children must point forward, so evaluation always terminates
                ensure!(left > i && right > i, "tree {idx} node {i}: child points backwards");
                ensure!(threshold.is_finite(), "tree {idx} node {i}: threshold not finite");
            }
        }
        Ok(())
    }

    fn evaluate(&self, x: &[f64; N]) -> Result<f64> {
        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    i = if x[*feature] <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(PredictError::Artifact(format!("tree node {i} missing")));
                }
            }
        }
    }
}

/// Averaging ensemble of regression trees (random-forest style).
#[derive(Debug, Clone)]
pub struct ForestRegressor {
    trees: Vec<Tree>,
}

impl ForestRegressor {
    pub fn new(trees: Vec<Tree>) -> anyhow::Result<Self> {
        ensure!(!trees.is_empty(), "forest has no trees");
        for (idx, t) in trees.iter().enumerate() {
            t.validate(idx)?;
        }
        Ok(Self { trees })
    }
}

impl Regressor for ForestRegressor {
    fn predict(&self, features: &ScaledFeatures) -> Result<f64> {
        let x = features.to_array();
        let mut sum = 0.0;
        for t in &self.trees {
            sum += t.evaluate(&x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}

#[cfg(feature = "torch")]
mod torch {
    use std::path::Path;

    use anyhow::{bail, Context};
    use tch::{kind::Kind, CModule, Device, Tensor};

    use super::{Regressor, N};
    use crate::error::{PredictError, Result};
    use crate::features::ScaledFeatures;

    /// TorchScript regression module: `[1, 8]` float in, one value out.
    pub struct TorchRegressor {
        model: CModule,
        device: Device,
    }

    impl TorchRegressor {
        pub fn load(path: &Path) -> anyhow::Result<Self> {
            let device = Device::Cpu;
            let model = CModule::load_on_device(path, device)
                .with_context(|| format!("failed to load TorchScript {}", path.display()))?;

            // Check output shape with a dummy forward
            let dummy = Tensor::zeros([1, N as i64], (Kind::Float, device));
            let out = model.forward_ts(&[dummy])?;
            if out.numel() != 1 {
                bail!("unexpected model output size: {:?}", out.size());
            }
            Ok(Self { model, device })
        }
    }

    impl Regressor for TorchRegressor {
        fn predict(&self, features: &ScaledFeatures) -> Result<f64> {
            let x = features.to_array().map(|v| v as f32);
            let input = Tensor::from_slice(&x)
                .reshape([1, N as i64])
                .to_device(self.device);
            let out = self
                .model
                .forward_ts(&[input])
                .map_err(|e| PredictError::Artifact(e.to_string()))?;
            if out.numel() != 1 {
                return Err(PredictError::Artifact(format!(
                    "unexpected model output size: {:?}",
                    out.size()
                )));
            }
            Ok(out.to_kind(Kind::Double).view([-1]).double_value(&[0]))
        }
    }
}
