use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::artifacts::ArtifactPaths;

/// Service settings, read from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub artifacts: ArtifactPaths,
    pub bind_addr: SocketAddr,
    /// `LOG_PRED=1`: log the feature vectors of every request.
    pub log_features: bool,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = |key: &str, default: &str| {
            PathBuf::from(get(key).unwrap_or_else(|| default.to_string()))
        };
        let artifacts = ArtifactPaths {
            model: path("MODEL_PATH", "reg_model.json"),
            scaler: path("SCALER_PATH", "scaler.json"),
            encoder: path("ENCODER_PATH", "target_encode.json"),
        };

        let host: IpAddr = match get("BIND_ADDR") {
            Some(h) => h.parse().with_context(|| format!("invalid BIND_ADDR {h:?}"))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port: u16 = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid PORT {p:?}"))?,
            None => 8080,
        };

        Ok(Self {
            artifacts,
            bind_addr: SocketAddr::new(host, port),
            log_features: get("LOG_PRED").as_deref() == Some("1"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.artifacts.model, PathBuf::from("reg_model.json"));
        assert_eq!(cfg.artifacts.scaler, PathBuf::from("scaler.json"));
        assert_eq!(cfg.artifacts.encoder, PathBuf::from("target_encode.json"));
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert!(!cfg.log_features);
    }

    #[test]
    fn test_overrides() {
        let cfg = ServiceConfig::from_lookup(lookup(&[
            ("MODEL_PATH", "/m/forest.json"),
            ("BIND_ADDR", "127.0.0.1"),
            ("PORT", "9000"),
            ("LOG_PRED", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.artifacts.model, PathBuf::from("/m/forest.json"));
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert!(cfg.log_features);
    }

    #[test]
    fn test_bad_port() {
        let err = ServiceConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("invalid PORT"));
    }
}
