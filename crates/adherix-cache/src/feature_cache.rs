//! The feature cache proper: keys, serialization, degradation.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use adherix_common::error::Result;
use adherix_common::schema::FeatureVector;

use crate::store::CacheStore;

/// Outcome of one cache lookup. `Miss` is a cold key; `Error` is a
/// store failure or a corrupt payload. Both mean "compute", but
/// callers count them separately — a dead cache service must not look
/// like a run of cold keys.
#[derive(Debug, PartialEq)]
pub enum CacheLookup {
    Hit(FeatureVector),
    Miss,
    Error,
}

/// Caches computed feature vectors keyed by (patient, data version).
///
/// A stale data version simply never gets looked up again, so an
/// update to the patient's record invalidates cached features without
/// an explicit purge; TTL expiry bounds memory for the leftovers.
/// Every store failure degrades to a miss (get) or a no-op (put) with
/// a warning — a cache outage must never fail a prediction.
pub struct FeatureCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl FeatureCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key(patient_id: Uuid, data_version: &str) -> String {
        format!("features:{patient_id}:{data_version}")
    }

    fn patient_prefix(patient_id: Uuid) -> String {
        format!("features:{patient_id}:")
    }

    /// Look up a cached vector. Never fails the caller: store outages
    /// and corrupt payloads degrade to a compute, reported as
    /// [`CacheLookup::Error`].
    pub async fn get(&self, patient_id: Uuid, data_version: &str) -> CacheLookup {
        let key = Self::key(patient_id, data_version);
        let bytes = match self.store.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                warn!(%patient_id, error = %e, "cache get failed; computing features");
                return CacheLookup::Error;
            }
        };
        match serde_json::from_slice::<FeatureVector>(&bytes) {
            Ok(vector) => CacheLookup::Hit(vector),
            Err(e) => {
                warn!(%patient_id, error = %e, "corrupt cache entry; computing features");
                CacheLookup::Error
            }
        }
    }

    /// Write-through after a miss. Best-effort.
    pub async fn put(&self, patient_id: Uuid, data_version: &str, vector: &FeatureVector) {
        let bytes = match serde_json::to_vec(vector) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%patient_id, error = %e, "failed to serialize features for cache");
                return;
            }
        };
        let key = Self::key(patient_id, data_version);
        if let Err(e) = self.store.set(&key, bytes, self.ttl).await {
            warn!(%patient_id, error = %e, "cache put failed; continuing without cache");
        }
    }

    /// Drop every cached vector for a patient, regardless of version
    /// or remaining TTL. Used when the underlying record changes.
    pub async fn invalidate(&self, patient_id: Uuid) -> Result<()> {
        self.store
            .delete_prefix(&Self::patient_prefix(patient_id))
            .await
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FailingCacheStore, MemoryCacheStore};

    fn vector() -> FeatureVector {
        let mut v = FeatureVector::defaults();
        v.set("cd4_count", 380.0).unwrap();
        v
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = FeatureCache::new(
            Arc::new(MemoryCacheStore::new()),
            Duration::from_secs(60),
        );
        let id = Uuid::new_v4();
        cache.put(id, "v1", &vector()).await;
        assert_eq!(cache.get(id, "v1").await, CacheLookup::Hit(vector()));
    }

    #[tokio::test]
    async fn test_different_version_is_a_miss() {
        let cache = FeatureCache::new(
            Arc::new(MemoryCacheStore::new()),
            Duration::from_secs(60),
        );
        let id = Uuid::new_v4();
        cache.put(id, "v1", &vector()).await;
        assert_eq!(cache.get(id, "v2").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_expiry_is_a_miss() {
        let cache = FeatureCache::new(Arc::new(MemoryCacheStore::new()), Duration::ZERO);
        let id = Uuid::new_v4();
        cache.put(id, "v1", &vector()).await;
        assert_eq!(cache.get(id, "v1").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_invalidate_removes_all_versions() {
        let cache = FeatureCache::new(
            Arc::new(MemoryCacheStore::new()),
            Duration::from_secs(60),
        );
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        cache.put(id, "v1", &vector()).await;
        cache.put(id, "v2", &vector()).await;
        cache.put(other, "v1", &vector()).await;

        cache.invalidate(id).await.unwrap();
        assert_eq!(cache.get(id, "v1").await, CacheLookup::Miss);
        assert_eq!(cache.get(id, "v2").await, CacheLookup::Miss);
        assert_eq!(cache.get(other, "v1").await, CacheLookup::Hit(vector()));
    }

    #[tokio::test]
    async fn test_store_outage_reported_not_raised() {
        let cache = FeatureCache::new(Arc::new(FailingCacheStore), Duration::from_secs(60));
        let id = Uuid::new_v4();
        // neither call returns an error to the caller
        cache.put(id, "v1", &vector()).await;
        assert_eq!(cache.get(id, "v1").await, CacheLookup::Error);
    }

    #[tokio::test]
    async fn test_corrupt_entry_reported_not_served() {
        let store = Arc::new(MemoryCacheStore::new());
        let id = Uuid::new_v4();
        let key = format!("features:{id}:v1");
        store
            .set(&key, b"not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let cache = FeatureCache::new(store, Duration::from_secs(60));
        assert_eq!(cache.get(id, "v1").await, CacheLookup::Error);
    }
}
