//! Runtime configuration for the prediction core.
//!
//! Loaded from a TOML file; every section has defaults so a missing
//! file still yields a runnable (if generic) configuration. Thresholds
//! and limits are validated on load, not at first use.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AdherixError, Result};
use crate::risk::RiskThresholds;

/// Strict: a failed audit write fails the prediction.
/// BestEffort: scoring must not fail merely because the audit write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    Strict,
    BestEffort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the frozen GBDT artifact.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
}

fn default_artifact_path() -> String {
    "models/iit_gbdt.json".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Feature vector time-to-live in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    86_400 // 24 hours
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainConfig {
    /// Contributors reported per direction.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    4
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Patients scored simultaneously in a batch call.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    /// Deadline for one extraction round-trip to the patient store.
    #[serde(default = "default_extract_timeout_secs")]
    pub extract_timeout_secs: u64,

    #[serde(default = "default_persistence_mode")]
    pub persistence: PersistenceMode,
}

fn default_batch_concurrency() -> usize {
    8
}

fn default_extract_timeout_secs() -> u64 {
    5
}

fn default_persistence_mode() -> PersistenceMode {
    PersistenceMode::BestEffort
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: default_batch_concurrency(),
            extract_timeout_secs: default_extract_timeout_secs(),
            persistence: default_persistence_mode(),
        }
    }
}

impl PredictorConfig {
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Complete core configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdherixConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub risk: RiskThresholds,

    #[serde(default)]
    pub explain: ExplainConfig,

    #[serde(default)]
    pub predictor: PredictorConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl AdherixConfig {
    /// Load and validate a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&raw)
    }

    /// Parse and validate TOML config text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: AdherixConfig = toml::from_str(raw)
            .map_err(|e| AdherixError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.risk.validate()?;
        if self.explain.top_k == 0 {
            return Err(AdherixError::Config(
                "explain.top_k must be at least 1".into(),
            ));
        }
        if self.predictor.batch_concurrency == 0 {
            return Err(AdherixError::Config(
                "predictor.batch_concurrency must be at least 1".into(),
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(AdherixError::Config("cache.ttl_secs must be nonzero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AdherixConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AdherixConfig::from_toml(
            r#"
            [risk]
            medium = 0.25
            high = 0.55
            critical = 0.80

            [predictor]
            persistence = "strict"
            "#,
        )
        .unwrap();
        assert_eq!(config.risk.medium, 0.25);
        assert_eq!(config.predictor.persistence, PersistenceMode::Strict);
        // untouched sections keep their defaults
        assert_eq!(config.cache.ttl_secs, 86_400);
        assert_eq!(config.explain.top_k, 4);
    }

    #[test]
    fn test_bad_thresholds_rejected() {
        let result = AdherixConfig::from_toml(
            r#"
            [risk]
            medium = 0.9
            high = 0.5
            critical = 0.95
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = AdherixConfig::from_toml(
            r#"
            [predictor]
            batch_concurrency = 0
            "#,
        );
        assert!(result.is_err());
    }
}
