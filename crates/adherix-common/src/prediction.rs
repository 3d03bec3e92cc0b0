//! Prediction output types.
//!
//! A [`PredictionResult`] is immutable once created and persisted
//! append-only: re-scoring a patient produces a new record, never an
//! update in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::risk::RiskLevel;
use crate::schema::FeatureVector;

/// One ranked contributor in an explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub feature: String,
    /// Signed attribution: positive pushes risk up.
    pub contribution: f64,
    /// Feature value the model actually saw.
    pub value: f64,
    pub description: String,
}

/// Per-feature attribution for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Expected raw margin before seeing this patient's features.
    pub baseline: f64,
    /// Top-K factors pushing risk up, largest first.
    pub top_positive: Vec<FactorContribution>,
    /// Top-K factors pushing risk down, largest magnitude first.
    pub top_negative: Vec<FactorContribution>,
    pub summary: String,
}

/// Outcome of the explanation step, kept distinct so callers can tell
/// "not asked" from "failed" from "succeeded with zero factors".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExplanationOutcome {
    NotRequested,
    Unsupported { reason: String },
    Explained(Explanation),
}

impl ExplanationOutcome {
    pub fn explanation(&self) -> Option<&Explanation> {
        match self {
            ExplanationOutcome::Explained(e) => Some(e),
            _ => None,
        }
    }
}

/// The result of one scoring call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub model_version: String,
    /// Calibrated probability of interruption in treatment, in [0, 1].
    pub probability: f64,
    /// Untransformed model margin; kept for calibration audits.
    pub raw_margin: f64,
    pub risk_level: RiskLevel,
    /// Distance from the decision midpoint, |2p - 1|.
    pub confidence: f64,
    /// Features the model actually scored, overrides included.
    pub features: FeatureVector,
    pub explanation: ExplanationOutcome,
    pub created_at: DateTime<Utc>,
}

impl PredictionResult {
    /// Confidence as distance from the 0.5 midpoint.
    pub fn confidence_from(probability: f64) -> f64 {
        (2.0 * probability - 1.0).abs()
    }
}
