//! Process metrics endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use adherix_predictor::MetricsSnapshot;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct MetricsReport {
    pub uptime_secs: u64,
    #[serde(flatten)]
    pub predictor: MetricsSnapshot,
}

/// GET /api/metrics
pub async fn metrics(State(state): State<SharedState>) -> Json<MetricsReport> {
    Json(MetricsReport {
        uptime_secs: state.started_at.elapsed().as_secs(),
        predictor: state.predictor.metrics().snapshot(),
    })
}
