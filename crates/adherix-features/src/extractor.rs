//! Feature extraction: raw snapshot facts → dense model vector.
//!
//! Every feature has a documented imputation default in the schema,
//! so the produced vector is always complete — the model requires a
//! dense input and never sees a missing value. A raw fact that is
//! present but cannot be coerced to the expected shape is a
//! `SchemaMismatch`, which is a bug between collaborators and is not
//! papered over with the default.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use adherix_common::error::{AdherixError, Result};
use adherix_common::schema::FeatureVector;

use crate::snapshot::PatientSnapshot;
use crate::store::PatientStore;

/// Transforms a patient's raw record into the fixed feature vector.
pub struct FeatureExtractor {
    store: Arc<dyn PatientStore>,
}

impl FeatureExtractor {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    /// Current data-version tag for a patient, used as the cache key
    /// component. `DataUnavailable` if the patient has no record.
    pub async fn data_version(&self, patient_id: Uuid) -> Result<String> {
        self.store
            .head_version(patient_id)
            .await?
            .ok_or_else(|| AdherixError::DataUnavailable(format!("patient {patient_id} not found")))
    }

    /// Extract the feature vector for a patient as of now.
    pub async fn extract(&self, patient_id: Uuid) -> Result<FeatureVector> {
        self.extract_at(patient_id, Utc::now()).await
    }

    /// Extraction with an explicit "now", for deterministic tests.
    pub async fn extract_at(
        &self,
        patient_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<FeatureVector> {
        let snapshot = self
            .store
            .fetch_snapshot(patient_id)
            .await?
            .ok_or_else(|| {
                AdherixError::DataUnavailable(format!("patient {patient_id} not found"))
            })?;
        vectorize(&snapshot, as_of)
    }
}

/// Pure transform from snapshot to vector. Deterministic given
/// identical inputs; the cache and the tests rely on that.
pub fn vectorize(snapshot: &PatientSnapshot, as_of: DateTime<Utc>) -> Result<FeatureVector> {
    let mut vector = FeatureVector::defaults();

    if let Some(birthdate) = snapshot.birthdate {
        let days = (as_of.date_naive() - birthdate).num_days();
        if days < 0 {
            return Err(AdherixError::SchemaMismatch(format!(
                "birthdate {birthdate} is in the future"
            )));
        }
        vector.set("age", (days as f64 / 365.25).floor())?;
    }

    if let Some(sex) = snapshot.sex.as_deref() {
        vector.set("sex_code", coerce_sex(sex)?)?;
    }

    if let Some(cd4) = snapshot.cd4_count {
        if !cd4.is_finite() || cd4 < 0.0 {
            return Err(AdherixError::SchemaMismatch(format!(
                "CD4 count {cd4} is not a valid cell count"
            )));
        }
        vector.set("cd4_count", cd4)?;
    }

    if let Some(vl) = snapshot.viral_load.as_deref() {
        vector.set("viral_load_suppressed", coerce_viral_load(vl)?)?;
    }

    if let Some(start) = snapshot.art_start_date {
        let days = (as_of.date_naive() - start).num_days().max(0);
        vector.set("months_on_art", days as f64 / 30.44)?;
    }

    if let Some(last_visit) = snapshot.last_visit_date {
        let days = (as_of.date_naive() - last_visit).num_days().max(0);
        vector.set("days_since_last_visit", days as f64)?;
    }

    if let Some(missed) = snapshot.missed_appointments_6m {
        if missed < 0 {
            return Err(AdherixError::SchemaMismatch(format!(
                "missed appointment count {missed} is negative"
            )));
        }
        vector.set("missed_appointments_6m", missed as f64)?;
    }

    if let Some(adherence) = snapshot.pickup_adherence {
        vector.set("pickup_adherence_pct", normalize_adherence(adherence)?)?;
    }

    if let Some(distance) = snapshot.distance_to_facility_km {
        if !distance.is_finite() || distance < 0.0 {
            return Err(AdherixError::SchemaMismatch(format!(
                "distance {distance} km is not a valid distance"
            )));
        }
        vector.set("distance_to_facility_km", distance)?;
    }

    if let Some(has_phone) = snapshot.has_phone {
        vector.set("has_phone", bool_code(has_phone))?;
    }

    if let Some(has_support) = snapshot.has_support_system {
        vector.set("has_support_system", bool_code(has_support))?;
    }

    if let Some(regimen) = snapshot.regimen.as_deref() {
        vector.set("regimen_code", regimen_code(regimen))?;
    }

    if let Some(prior) = snapshot.prior_interruptions {
        if prior < 0 {
            return Err(AdherixError::SchemaMismatch(format!(
                "prior interruption count {prior} is negative"
            )));
        }
        vector.set("prior_interruptions", prior as f64)?;
    }

    Ok(vector)
}

fn bool_code(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn coerce_sex(raw: &str) -> Result<f64> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "m" | "male" | "1" => Ok(1.0),
        "f" | "female" | "0" => Ok(0.0),
        other => Err(AdherixError::SchemaMismatch(format!(
            "uncoercible sex marker '{other}'"
        ))),
    }
}

/// Status words map directly; a bare number is copies/mL with the
/// usual 1000 copies/mL suppression cutoff.
fn coerce_viral_load(raw: &str) -> Result<f64> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "suppressed" | "undetectable" | "tnd" | "ldl" => return Ok(1.0),
        "unsuppressed" | "detectable" | "high" => return Ok(0.0),
        _ => {}
    }
    if let Ok(copies) = normalized.parse::<f64>() {
        if copies.is_finite() && copies >= 0.0 {
            return Ok(if copies < 1000.0 { 1.0 } else { 0.0 });
        }
    }
    Err(AdherixError::SchemaMismatch(format!(
        "uncoercible viral load '{raw}'"
    )))
}

/// Source systems report adherence as either a fraction or a percent;
/// values at or below 1.0 are treated as fractions. Output clamped to
/// [0, 100].
fn normalize_adherence(raw: f64) -> Result<f64> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(AdherixError::SchemaMismatch(format!(
            "uncoercible adherence value {raw}"
        )));
    }
    let pct = if raw <= 1.0 { raw * 100.0 } else { raw };
    Ok(pct.clamp(0.0, 100.0))
}

/// Fixed regimen coding the model was trained with. Regimens outside
/// the map fall into the "other" bucket (0), matching training.
fn regimen_code(raw: &str) -> f64 {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TDF/3TC/DTG" => 1.0,
        "TDF/3TC/EFV" => 2.0,
        "AZT/3TC/NVP" => 3.0,
        "ABC/3TC/DTG" => 4.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockPatientStore;
    use adherix_common::schema::FEATURE_SCHEMA;
    use chrono::{NaiveDate, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
    }

    fn rich_snapshot(id: Uuid) -> PatientSnapshot {
        PatientSnapshot {
            patient_id: id,
            birthdate: NaiveDate::from_ymd_opt(1990, 6, 1),
            sex: Some("F".into()),
            cd4_count: Some(380.0),
            viral_load: Some("1500".into()),
            art_start_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            last_visit_date: NaiveDate::from_ymd_opt(2026, 4, 1),
            missed_appointments_6m: Some(3),
            pickup_adherence: Some(65.0),
            distance_to_facility_km: Some(15.5),
            has_phone: Some(true),
            has_support_system: Some(false),
            regimen: Some("TDF/3TC/DTG".into()),
            prior_interruptions: Some(1),
            updated_at: None,
        }
    }

    #[test]
    fn test_known_facts_pass_through_verbatim() {
        let vector = vectorize(&rich_snapshot(Uuid::new_v4()), as_of()).unwrap();
        assert_eq!(vector.get("cd4_count"), Some(380.0));
        assert_eq!(vector.get("missed_appointments_6m"), Some(3.0));
        assert_eq!(vector.get("pickup_adherence_pct"), Some(65.0));
        assert_eq!(vector.get("distance_to_facility_km"), Some(15.5));
        assert_eq!(vector.get("age"), Some(36.0));
        assert_eq!(vector.get("viral_load_suppressed"), Some(0.0));
        assert_eq!(vector.get("days_since_last_visit"), Some(61.0));
        assert_eq!(vector.get("regimen_code"), Some(1.0));
        assert_eq!(vector.get("has_support_system"), Some(0.0));
    }

    #[test]
    fn test_empty_snapshot_imputes_every_feature() {
        let vector = vectorize(&PatientSnapshot::empty(Uuid::new_v4()), as_of()).unwrap();
        for spec in FEATURE_SCHEMA {
            assert_eq!(
                vector.get(spec.name),
                Some(spec.default),
                "feature {} must fall back to its default",
                spec.name
            );
        }
    }

    #[test]
    fn test_partial_snapshot_still_dense() {
        let id = Uuid::new_v4();
        let mut snap = PatientSnapshot::empty(id);
        snap.cd4_count = Some(380.0);
        snap.missed_appointments_6m = Some(3);
        let vector = vectorize(&snap, as_of()).unwrap();
        assert_eq!(vector.len(), FEATURE_SCHEMA.len());
        for value in vector.values() {
            assert!(value.is_finite());
        }
    }

    #[test]
    fn test_deterministic() {
        let snap = rich_snapshot(Uuid::new_v4());
        let a = vectorize(&snap, as_of()).unwrap();
        let b = vectorize(&snap, as_of()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fractional_adherence_scaled() {
        let mut snap = PatientSnapshot::empty(Uuid::new_v4());
        snap.pickup_adherence = Some(0.65);
        let vector = vectorize(&snap, as_of()).unwrap();
        assert_eq!(vector.get("pickup_adherence_pct"), Some(65.0));
    }

    #[test]
    fn test_garbage_sex_is_schema_mismatch() {
        let mut snap = PatientSnapshot::empty(Uuid::new_v4());
        snap.sex = Some("banana".into());
        let err = vectorize(&snap, as_of()).unwrap_err();
        assert!(matches!(err, AdherixError::SchemaMismatch(_)));
    }

    #[test]
    fn test_viral_load_coercion() {
        assert_eq!(coerce_viral_load("Suppressed").unwrap(), 1.0);
        assert_eq!(coerce_viral_load("TND").unwrap(), 1.0);
        assert_eq!(coerce_viral_load("999").unwrap(), 1.0);
        assert_eq!(coerce_viral_load("1000").unwrap(), 0.0);
        assert_eq!(coerce_viral_load("detectable").unwrap(), 0.0);
        assert!(coerce_viral_load("??").is_err());
    }

    #[test]
    fn test_negative_counts_rejected() {
        let mut snap = PatientSnapshot::empty(Uuid::new_v4());
        snap.missed_appointments_6m = Some(-1);
        assert!(vectorize(&snap, as_of()).is_err());
    }

    #[tokio::test]
    async fn test_extract_unknown_patient_is_data_unavailable() {
        let store = Arc::new(MockPatientStore::new());
        let extractor = FeatureExtractor::new(store);
        let err = extractor.extract(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AdherixError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_extract_through_store() {
        let id = Uuid::new_v4();
        let store = Arc::new(MockPatientStore::new().with(rich_snapshot(id)));
        let extractor = FeatureExtractor::new(store.clone());

        let vector = extractor.extract_at(id, as_of()).await.unwrap();
        assert_eq!(vector.get("cd4_count"), Some(380.0));
        assert_eq!(store.fetch_count(), 1);

        let version = extractor.data_version(id).await.unwrap();
        assert!(version.starts_with('h'));
        // version probe must not re-run extraction
        assert_eq!(store.fetch_count(), 1);
    }
}
