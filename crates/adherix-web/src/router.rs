//! Axum router — maps all URL paths to handlers.

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    metrics::metrics,
    model::model_info,
    predict::{invalidate_cache, predict, predict_batch},
    system::health,
};
use crate::sse::sse_handler;
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Prediction
        .route("/api/predict", post(predict))
        .route("/api/predict/batch", post(predict_batch))
        .route("/api/cache/{patient_id}", delete(invalidate_cache))

        // Introspection
        .route("/api/model", get(model_info))
        .route("/api/metrics", get(metrics))
        .route("/health", get(health))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
