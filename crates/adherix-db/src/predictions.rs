//! Append-only prediction audit writes.

use std::sync::Arc;

use async_trait::async_trait;

use adherix_common::error::{AdherixError, Result};
use adherix_common::prediction::PredictionResult;
use adherix_predictor::PredictionStore;

use crate::database::Database;
use crate::schema::TABLE_PREDICTIONS;

pub struct PgPredictionStore {
    db: Arc<Database>,
}

impl PgPredictionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PredictionStore for PgPredictionStore {
    async fn save(&self, prediction: &PredictionResult) -> Result<()> {
        let features = serde_json::to_value(&prediction.features)?;
        let explanation = serde_json::to_value(&prediction.explanation)?;

        let query = format!(
            "INSERT INTO {TABLE_PREDICTIONS} \
             (id, patient_id, model_version, probability, raw_margin, \
              risk_level, confidence, features, explanation, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        self.db
            .client()
            .execute(
                &query,
                &[
                    &prediction.id,
                    &prediction.patient_id,
                    &prediction.model_version,
                    &prediction.probability,
                    &prediction.raw_margin,
                    &prediction.risk_level.as_str(),
                    &prediction.confidence,
                    &features,
                    &explanation,
                    &prediction.created_at,
                ],
            )
            .await
            .map_err(|e| AdherixError::Persistence(e.to_string()))?;
        Ok(())
    }
}
