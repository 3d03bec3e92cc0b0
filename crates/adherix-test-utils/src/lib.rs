//! Shared test fixtures: a small deterministic GBDT artifact with
//! hand-computed outputs, canned patient snapshots, and a test
//! configuration. Used from dev-dependencies only.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use adherix_common::config::AdherixConfig;
use adherix_common::schema::{FeatureVector, FEATURE_SCHEMA};
use adherix_features::PatientSnapshot;
use adherix_model::GbdtModel;

/// Fixed "now" so extraction-derived features are reproducible.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
}

/// Three-tree test artifact, base score -1.0.
///
/// Hand-computed behavior, with `v` the schema-ordered vector:
/// - tree 0: adherence < 80 → +1.2, else -0.4
/// - tree 1: missed appointments < 2 → -0.3, else +0.9
/// - tree 2: CD4 < 350 → +0.5, else days-since-visit < 60 → -0.2, else +0.6
///
/// For [`example_vector`] the raw margin is 0.9 and the probability
/// sigmoid(0.9) ≈ 0.7109 (HIGH under default thresholds).
pub fn test_artifact_json() -> String {
    let names: Vec<String> = FEATURE_SCHEMA.iter().map(|s| s.name.to_string()).collect();
    serde_json::json!({
        "model_version": "iit-gbdt-test",
        "feature_names": names,
        "base_score": -1.0,
        "trees": [
            { "nodes": [
                { "kind": "split", "feature": 7, "threshold": 80.0, "left": 1, "right": 2 },
                { "kind": "leaf", "value": 1.2 },
                { "kind": "leaf", "value": -0.4 }
            ]},
            { "nodes": [
                { "kind": "split", "feature": 6, "threshold": 2.0, "left": 1, "right": 2 },
                { "kind": "leaf", "value": -0.3 },
                { "kind": "leaf", "value": 0.9 }
            ]},
            { "nodes": [
                { "kind": "split", "feature": 2, "threshold": 350.0, "left": 1, "right": 2 },
                { "kind": "leaf", "value": 0.5 },
                { "kind": "split", "feature": 5, "threshold": 60.0, "left": 3, "right": 4 },
                { "kind": "leaf", "value": -0.2 },
                { "kind": "leaf", "value": 0.6 }
            ]}
        ]
    })
    .to_string()
}

pub fn test_model() -> GbdtModel {
    GbdtModel::from_json(&test_artifact_json()).expect("test artifact must parse")
}

/// A model with a bias but no trees: scores fine, cannot be explained.
pub fn constant_model() -> GbdtModel {
    let names: Vec<String> = FEATURE_SCHEMA.iter().map(|s| s.name.to_string()).collect();
    let raw = serde_json::json!({
        "model_version": "iit-constant-test",
        "feature_names": names,
        "base_score": 0.25,
        "trees": []
    })
    .to_string();
    GbdtModel::from_json(&raw).expect("constant artifact must parse")
}

/// A worked example patient as a ready-made vector: CD4 380,
/// 3 missed appointments, 65% adherence, 15.5 km from the facility,
/// everything else at its imputation default.
pub fn example_vector() -> FeatureVector {
    let mut v = FeatureVector::defaults();
    v.set("cd4_count", 380.0).expect("schema feature");
    v.set("missed_appointments_6m", 3.0).expect("schema feature");
    v.set("pickup_adherence_pct", 65.0).expect("schema feature");
    v.set("distance_to_facility_km", 15.5).expect("schema feature");
    v
}

/// Snapshot that vectorizes (at [`fixed_now`]) to [`example_vector`]
/// except for the date-derived features.
pub fn high_risk_snapshot(patient_id: Uuid) -> PatientSnapshot {
    let mut snap = PatientSnapshot::empty(patient_id);
    snap.cd4_count = Some(380.0);
    snap.missed_appointments_6m = Some(3);
    snap.pickup_adherence = Some(65.0);
    snap.distance_to_facility_km = Some(15.5);
    snap
}

/// A stable, engaged patient: suppressed, adherent, recently seen.
pub fn low_risk_snapshot(patient_id: Uuid) -> PatientSnapshot {
    let mut snap = PatientSnapshot::empty(patient_id);
    snap.birthdate = NaiveDate::from_ymd_opt(1988, 2, 14);
    snap.sex = Some("F".into());
    snap.cd4_count = Some(650.0);
    snap.viral_load = Some("suppressed".into());
    snap.missed_appointments_6m = Some(0);
    snap.pickup_adherence = Some(98.0);
    snap.last_visit_date = NaiveDate::from_ymd_opt(2026, 5, 20);
    snap.regimen = Some("TDF/3TC/DTG".into());
    snap
}

/// Default config with a fast extraction timeout for tests.
pub fn test_config() -> AdherixConfig {
    let mut config = AdherixConfig::default();
    config.predictor.extract_timeout_secs = 1;
    config
}
