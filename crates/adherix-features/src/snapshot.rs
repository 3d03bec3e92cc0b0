//! The raw facts a prediction is derived from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Minimal clinical/administrative facts needed to score one patient.
///
/// Assembled on demand from the patient, visit, and observation
/// collaborators; never persisted as its own entity. Every clinical
/// field is optional — imputation happens downstream in the extractor,
/// not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub patient_id: Uuid,
    pub birthdate: Option<NaiveDate>,
    /// Raw sex marker as recorded ("F", "male", ...). Coerced later.
    pub sex: Option<String>,
    /// Most recent CD4 count (cells/mm3).
    pub cd4_count: Option<f64>,
    /// Most recent viral load as recorded: a status word
    /// ("suppressed", "detectable") or a copies/mL figure.
    pub viral_load: Option<String>,
    pub art_start_date: Option<NaiveDate>,
    pub last_visit_date: Option<NaiveDate>,
    pub missed_appointments_6m: Option<i32>,
    /// Pickup adherence as recorded: either a fraction (0..=1) or a
    /// percentage (0..=100).
    pub pickup_adherence: Option<f64>,
    pub distance_to_facility_km: Option<f64>,
    pub has_phone: Option<bool>,
    pub has_support_system: Option<bool>,
    pub regimen: Option<String>,
    pub prior_interruptions: Option<i32>,
    /// Last-modified signal from the source store, when it has one.
    pub updated_at: Option<DateTime<Utc>>,
}

impl PatientSnapshot {
    /// An empty snapshot; tests and fixtures fill in what they need.
    pub fn empty(patient_id: Uuid) -> Self {
        Self {
            patient_id,
            birthdate: None,
            sex: None,
            cd4_count: None,
            viral_load: None,
            art_start_date: None,
            last_visit_date: None,
            missed_appointments_6m: None,
            pickup_adherence: None,
            distance_to_facility_km: None,
            has_phone: None,
            has_support_system: None,
            regimen: None,
            prior_interruptions: None,
            updated_at: None,
        }
    }

    /// Version tag for cache keying: any change to the underlying
    /// record must change this value.
    ///
    /// Uses the store's last-modified timestamp when available,
    /// otherwise a content hash of the canonical snapshot JSON
    /// (TTL-only expiry still bounds staleness either way).
    pub fn data_version(&self) -> String {
        if let Some(updated_at) = self.updated_at {
            return timestamp_version(updated_at);
        }
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        let mut tag = String::with_capacity(17);
        tag.push('h');
        for byte in digest.iter().take(8) {
            tag.push_str(&format!("{byte:02x}"));
        }
        tag
    }
}

/// Version tag derived from a last-modified timestamp. Stores with a
/// cheap last-modified probe build the same tag without a full fetch.
pub fn timestamp_version(updated_at: DateTime<Utc>) -> String {
    format!("t{}", updated_at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_version_prefers_updated_at() {
        let mut snap = PatientSnapshot::empty(Uuid::new_v4());
        snap.updated_at = Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        assert!(snap.data_version().starts_with('t'));
    }

    #[test]
    fn test_content_hash_is_stable_and_sensitive() {
        let id = Uuid::new_v4();
        let mut a = PatientSnapshot::empty(id);
        a.cd4_count = Some(380.0);
        let b = a.clone();
        assert_eq!(a.data_version(), b.data_version());

        let mut c = a.clone();
        c.cd4_count = Some(381.0);
        assert_ne!(a.data_version(), c.data_version());
    }
}
