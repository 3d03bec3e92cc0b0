//! Model introspection: version and the feature schema clients must
//! speak when sending overrides.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use adherix_common::schema::FEATURE_SCHEMA;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub model_version: String,
    pub feature_count: usize,
    pub features: Vec<FeatureInfo>,
}

#[derive(Debug, Serialize)]
pub struct FeatureInfo {
    pub name: &'static str,
    pub default: f64,
    pub description: &'static str,
}

/// GET /api/model
pub async fn model_info(State(state): State<SharedState>) -> Json<ModelInfo> {
    let model = state.predictor.model();
    Json(ModelInfo {
        model_version: model.version().to_string(),
        feature_count: model.feature_count(),
        features: FEATURE_SCHEMA
            .iter()
            .map(|spec| FeatureInfo {
                name: spec.name,
                default: spec.default,
                description: spec.description,
            })
            .collect(),
    })
}
