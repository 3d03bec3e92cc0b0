//! adherix-predictor — The prediction orchestrator.
//!
//! Wires the extractor, cache, model, classifier, explainer, and
//! persistence together: single and batch prediction, caller-supplied
//! feature overrides, strict vs. best-effort audit writes, and bounded
//! batch fan-out. Stateless end-to-end apart from the cache's TTL
//! state and the model's load-then-immutable state.

pub mod metrics;
pub mod predictor;
pub mod store;

pub use metrics::{MetricsSnapshot, PredictorMetrics};
pub use predictor::{BatchItem, PredictOptions, Predictor};
pub use store::{FailingPredictionStore, MemoryPredictionStore, PredictionStore};
