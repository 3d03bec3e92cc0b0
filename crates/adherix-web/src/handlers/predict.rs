//! Prediction endpoints: single patient, batch, cache invalidation.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use adherix_common::prediction::PredictionResult;
use adherix_common::schema::feature_index;
use adherix_predictor::PredictOptions;

use crate::error::ApiError;
use crate::state::{AppEvent, SharedState};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub patient_id: Uuid,
    #[serde(default)]
    pub overrides: HashMap<String, f64>,
    #[serde(default)]
    pub include_explanation: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub patient_ids: Vec<Uuid>,
    #[serde(default)]
    pub overrides: HashMap<String, f64>,
    #[serde(default)]
    pub include_explanation: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub total: usize,
    pub failed: usize,
    pub items: Vec<Value>,
}

/// Reject unknown feature names up front so a typo is a 422, not a
/// mid-pipeline failure.
fn check_overrides(overrides: &HashMap<String, f64>) -> Result<(), ApiError> {
    for name in overrides.keys() {
        if feature_index(name).is_none() {
            return Err(ApiError::bad_request(format!(
                "unknown feature in overrides: {name}"
            )));
        }
    }
    Ok(())
}

/// POST /api/predict - score one patient
pub async fn predict(
    State(state): State<SharedState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictionResult>, ApiError> {
    check_overrides(&req.overrides)?;

    let options = PredictOptions {
        overrides: req.overrides,
        include_explanation: req.include_explanation,
    };
    let result = state.predictor.predict(req.patient_id, &options).await?;

    state.publish(AppEvent::PredictionScored {
        patient_id: result.patient_id.to_string(),
        risk_level: result.risk_level.as_str().to_string(),
        probability: result.probability,
    });

    Ok(Json(result))
}

/// POST /api/predict/batch - score a cohort; per-patient failures are
/// reported inline and never abort the rest
pub async fn predict_batch(
    State(state): State<SharedState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    check_overrides(&req.overrides)?;

    let options = PredictOptions {
        overrides: req.overrides,
        include_explanation: req.include_explanation,
    };
    let items = state
        .predictor
        .predict_batch(&req.patient_ids, &options)
        .await;

    let failed = items.iter().filter(|item| item.outcome.is_err()).count();
    let total = items.len();

    let items: Vec<Value> = items
        .into_iter()
        .map(|item| match item.outcome {
            Ok(result) => json!({
                "patient_id": item.patient_id,
                "status": "ok",
                "result": result,
            }),
            Err(e) => json!({
                "patient_id": item.patient_id,
                "status": "error",
                "error": e.to_string(),
            }),
        })
        .collect();

    state.publish(AppEvent::BatchCompleted { total, failed });

    Ok(Json(BatchResponse {
        total,
        failed,
        items,
    }))
}

/// DELETE /api/cache/{patient_id} - drop cached features after an
/// out-of-band record correction
pub async fn invalidate_cache(
    State(state): State<SharedState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.predictor.invalidate_cache(patient_id).await?;
    Ok(Json(json!({ "invalidated": patient_id })))
}
