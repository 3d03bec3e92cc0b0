//! adherix-common — Shared types, errors, and configuration used across all Adherix crates.

pub mod config;
pub mod error;
pub mod prediction;
pub mod risk;
pub mod schema;

// Re-export commonly used types
pub use config::AdherixConfig;
pub use error::{AdherixError, Result};
pub use prediction::{Explanation, ExplanationOutcome, FactorContribution, PredictionResult};
pub use risk::{classify, RiskLevel, RiskThresholds};
pub use schema::{FeatureVector, FEATURE_SCHEMA};
