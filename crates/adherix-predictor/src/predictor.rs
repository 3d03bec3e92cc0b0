//! The orchestrator proper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use adherix_cache::{CacheLookup, CacheStore, FeatureCache};
use adherix_common::config::{AdherixConfig, PersistenceMode};
use adherix_common::error::{AdherixError, Result};
use adherix_common::prediction::{ExplanationOutcome, PredictionResult};
use adherix_common::risk::{classify, RiskThresholds};
use adherix_explain::Explainer;
use adherix_features::{FeatureExtractor, PatientStore};
use adherix_model::GbdtModel;

use crate::metrics::PredictorMetrics;
use crate::store::PredictionStore;

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct PredictOptions {
    /// "What-if" feature values layered over the extracted vector.
    /// Overrides take precedence over extraction.
    pub overrides: HashMap<String, f64>,
    /// Explanations cost extra tree walks; off unless asked for.
    pub include_explanation: bool,
}

impl PredictOptions {
    pub fn with_explanation() -> Self {
        Self {
            include_explanation: true,
            ..Self::default()
        }
    }
}

/// One entry of a batch response. Input order is preserved.
#[derive(Debug)]
pub struct BatchItem {
    pub patient_id: Uuid,
    pub outcome: Result<PredictionResult>,
}

/// Entry point for scoring. Shared read-only across request handlers.
pub struct Predictor {
    extractor: FeatureExtractor,
    cache: FeatureCache,
    model: Arc<GbdtModel>,
    explainer: Explainer,
    store: Arc<dyn PredictionStore>,
    thresholds: RiskThresholds,
    persistence: PersistenceMode,
    batch_concurrency: usize,
    extract_timeout: Duration,
    metrics: PredictorMetrics,
}

impl Predictor {
    pub fn new(
        config: &AdherixConfig,
        patient_store: Arc<dyn PatientStore>,
        cache_store: Arc<dyn CacheStore>,
        model: Arc<GbdtModel>,
        prediction_store: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            extractor: FeatureExtractor::new(patient_store),
            cache: FeatureCache::new(cache_store, config.cache.ttl()),
            model,
            explainer: Explainer::new(config.explain.top_k),
            store: prediction_store,
            thresholds: config.risk.clone(),
            persistence: config.predictor.persistence,
            batch_concurrency: config.predictor.batch_concurrency.max(1),
            extract_timeout: config.predictor.extract_timeout(),
            metrics: PredictorMetrics::default(),
        }
    }

    pub fn model(&self) -> &GbdtModel {
        &self.model
    }

    pub fn metrics(&self) -> &PredictorMetrics {
        &self.metrics
    }

    /// Score one patient.
    pub async fn predict(
        &self,
        patient_id: Uuid,
        options: &PredictOptions,
    ) -> Result<PredictionResult> {
        let started = Instant::now();
        let result = self.predict_inner(patient_id, options).await;
        match &result {
            Ok(prediction) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                self.metrics.record_success(latency_ms);
                info!(
                    %patient_id,
                    probability = prediction.probability,
                    risk_level = prediction.risk_level.as_str(),
                    latency_ms,
                    "prediction complete"
                );
            }
            Err(e) => {
                self.metrics.record_failure();
                warn!(%patient_id, error = %e, "prediction failed");
            }
        }
        result
    }

    async fn predict_inner(
        &self,
        patient_id: Uuid,
        options: &PredictOptions,
    ) -> Result<PredictionResult> {
        let data_version = self
            .with_deadline(self.extractor.data_version(patient_id))
            .await?;

        let mut features = match self.cache.get(patient_id, &data_version).await {
            CacheLookup::Hit(vector) => {
                self.metrics.record_cache_hit();
                vector
            }
            lookup => {
                match lookup {
                    CacheLookup::Miss => self.metrics.record_cache_miss(),
                    _ => self.metrics.record_cache_error(),
                }
                let vector = self
                    .with_deadline(self.extractor.extract(patient_id))
                    .await?;
                self.cache.put(patient_id, &data_version, &vector).await;
                vector
            }
        };

        for (name, &value) in &options.overrides {
            features.set(name, value)?;
        }

        let (probability, raw_margin) = self.model.score(&features)?;
        let risk_level = classify(probability, &self.thresholds);

        let explanation = if options.include_explanation {
            match self.explainer.explain(&features, &self.model) {
                Ok(explanation) => ExplanationOutcome::Explained(explanation),
                Err(e) => {
                    self.metrics.record_attribution_failure();
                    warn!(%patient_id, error = %e, "attribution failed; returning score without explanation");
                    ExplanationOutcome::Unsupported {
                        reason: e.to_string(),
                    }
                }
            }
        } else {
            ExplanationOutcome::NotRequested
        };

        let result = PredictionResult {
            id: Uuid::new_v4(),
            patient_id,
            model_version: self.model.version().to_string(),
            probability,
            raw_margin,
            risk_level,
            confidence: PredictionResult::confidence_from(probability),
            features,
            explanation,
            created_at: chrono::Utc::now(),
        };

        if let Err(e) = self.store.save(&result).await {
            match self.persistence {
                PersistenceMode::Strict => {
                    error!(%patient_id, error = %e, "audit write failed; strict persistence propagates");
                    return Err(e);
                }
                PersistenceMode::BestEffort => {
                    self.metrics.record_persistence_failure();
                    warn!(%patient_id, error = %e, "audit write failed; returning prediction anyway");
                }
            }
        }

        Ok(result)
    }

    /// Score many patients. Items are isolated: one failure never
    /// aborts the rest, and the output preserves input order. At most
    /// `batch_concurrency` patients are in flight at once.
    pub async fn predict_batch(
        &self,
        patient_ids: &[Uuid],
        options: &PredictOptions,
    ) -> Vec<BatchItem> {
        let items: Vec<BatchItem> = stream::iter(patient_ids.iter().copied())
            .map(|patient_id| async move {
                BatchItem {
                    patient_id,
                    outcome: self.predict(patient_id, options).await,
                }
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await;

        let failed = items.iter().filter(|item| item.outcome.is_err()).count();
        info!(total = items.len(), failed, "batch prediction complete");
        items
    }

    /// Drop cached features for a patient, e.g. after an out-of-band
    /// record correction.
    pub async fn invalidate_cache(&self, patient_id: Uuid) -> Result<()> {
        self.cache.invalidate(patient_id).await
    }

    async fn with_deadline<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.extract_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AdherixError::Timeout(format!(
                "patient store call exceeded {:?}",
                self.extract_timeout
            ))),
        }
    }
}
