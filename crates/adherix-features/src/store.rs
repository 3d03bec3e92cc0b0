//! Trait for patient fact access.
//!
//! Abstracts over the patient/visit/observation stores so the
//! extractor can be exercised without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use adherix_common::error::Result;

use crate::snapshot::PatientSnapshot;

/// Read-only access to the facts a prediction is derived from.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Fetch the full snapshot for a patient, or None if the patient
    /// has no resolvable record.
    async fn fetch_snapshot(&self, patient_id: Uuid) -> Result<Option<PatientSnapshot>>;

    /// Cheap data-version probe (e.g. SELECT of a last-modified
    /// column). The default falls back to a full fetch for stores
    /// without a cheap signal.
    async fn head_version(&self, patient_id: Uuid) -> Result<Option<String>> {
        Ok(self
            .fetch_snapshot(patient_id)
            .await?
            .map(|snap| snap.data_version()))
    }
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// In-memory store with canned snapshots. Counts full fetches so
/// cache tests can assert the extractor ran exactly once.
pub struct MockPatientStore {
    snapshots: Mutex<HashMap<Uuid, PatientSnapshot>>,
    fetch_count: AtomicUsize,
}

impl MockPatientStore {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(HashMap::new()),
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// Add a snapshot.
    pub fn with(self, snapshot: PatientSnapshot) -> Self {
        self.insert(snapshot);
        self
    }

    pub fn insert(&self, snapshot: PatientSnapshot) {
        self.snapshots
            .lock()
            .expect("mock store lock")
            .insert(snapshot.patient_id, snapshot);
    }

    /// Number of full snapshot fetches served.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

impl Default for MockPatientStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatientStore for MockPatientStore {
    async fn fetch_snapshot(&self, patient_id: Uuid) -> Result<Option<PatientSnapshot>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .snapshots
            .lock()
            .expect("mock store lock")
            .get(&patient_id)
            .cloned())
    }

    // Version probes are not extractions; don't count them.
    async fn head_version(&self, patient_id: Uuid) -> Result<Option<String>> {
        Ok(self
            .snapshots
            .lock()
            .expect("mock store lock")
            .get(&patient_id)
            .map(|snap| snap.data_version()))
    }
}
