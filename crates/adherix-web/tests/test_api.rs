//! Router-level tests over an in-memory stack: mock patient store,
//! memory cache, memory prediction store, and the small deterministic
//! test model.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use adherix_cache::MemoryCacheStore;
use adherix_features::MockPatientStore;
use adherix_predictor::{MemoryPredictionStore, Predictor};
use adherix_web::router::build_router;
use adherix_web::state::AppState;

fn test_app(patients: MockPatientStore) -> Router {
    let predictor = Arc::new(Predictor::new(
        &adherix_test_utils::test_config(),
        Arc::new(patients),
        Arc::new(MemoryCacheStore::new()),
        Arc::new(adherix_test_utils::test_model()),
        Arc::new(MemoryPredictionStore::new()),
    ));
    build_router(AppState::new(predictor))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app(MockPatientStore::new());

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_version"], "iit-gbdt-test");
}

#[tokio::test]
async fn test_predict_happy_path() {
    let id = Uuid::new_v4();
    let app = test_app(MockPatientStore::new().with(adherix_test_utils::high_risk_snapshot(id)));

    let response = app
        .oneshot(post_json(
            "/api/predict",
            json!({ "patient_id": id, "include_explanation": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["patient_id"], id.to_string());
    assert_eq!(body["risk_level"], "HIGH");
    assert_eq!(body["explanation"]["status"], "explained");
}

#[tokio::test]
async fn test_predict_unknown_patient_is_404() {
    let app = test_app(MockPatientStore::new());

    let response = app
        .oneshot(post_json(
            "/api/predict",
            json!({ "patient_id": Uuid::new_v4() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_predict_unknown_override_is_422() {
    let id = Uuid::new_v4();
    let app = test_app(MockPatientStore::new().with(adherix_test_utils::high_risk_snapshot(id)));

    let response = app
        .oneshot(post_json(
            "/api/predict",
            json!({ "patient_id": id, "overrides": { "not_a_feature": 1.0 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("not_a_feature"));
}

#[tokio::test]
async fn test_batch_reports_per_patient_outcomes_in_order() {
    let known = Uuid::new_v4();
    let unknown = Uuid::new_v4();
    let app =
        test_app(MockPatientStore::new().with(adherix_test_utils::high_risk_snapshot(known)));

    let response = app
        .oneshot(post_json(
            "/api/predict/batch",
            json!({ "patient_ids": [known, unknown] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["failed"], 1);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["patient_id"], known.to_string());
    assert_eq!(items[0]["status"], "ok");
    assert_eq!(items[1]["patient_id"], unknown.to_string());
    assert_eq!(items[1]["status"], "error");
}

#[tokio::test]
async fn test_model_info_lists_schema() {
    let app = test_app(MockPatientStore::new());

    let response = app
        .oneshot(Request::get("/api/model").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["model_version"], "iit-gbdt-test");
    assert_eq!(body["feature_count"], 13);
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 13);
    assert_eq!(features[0]["name"], "age");
}

#[tokio::test]
async fn test_metrics_counts_requests() {
    let id = Uuid::new_v4();
    let app = test_app(MockPatientStore::new().with(adherix_test_utils::high_risk_snapshot(id)));

    let response = app
        .clone()
        .oneshot(post_json("/api/predict", json!({ "patient_id": id })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["predictions_total"], 1);
    assert_eq!(body["cache_misses"], 1);
}

#[tokio::test]
async fn test_cache_invalidation_endpoint() {
    let id = Uuid::new_v4();
    let app = test_app(MockPatientStore::new().with(adherix_test_utils::high_risk_snapshot(id)));

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/cache/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["invalidated"], id.to_string());
}
