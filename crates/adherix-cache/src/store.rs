//! Byte-level cache store trait and implementations.
//!
//! Mirrors the narrow surface of a remote cache service: `get`,
//! `set`-with-TTL, and prefix deletion for invalidation. A Redis
//! adapter would sit behind this same trait; the in-process map is
//! sufficient for a single-node deployment and for tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use adherix_common::error::{AdherixError, Result};

/// Narrow outbound boundary to the cache service.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry. Expired entries are a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write an entry with a time-to-live.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Remove every entry whose key starts with `prefix`.
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;
}

// ── In-process store ────────────────────────────────────────────────────────

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Tokio-RwLock map with lazy expiry: an expired entry is treated as
/// absent and evicted on the next lookup. No background sweep —
/// correctness must not depend on one.
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Live entry count (expired entries excluded).
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {} // expired; evict below
                None => return Ok(None),
            }
        }
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

// ── Failing store for degradation tests ─────────────────────────────────────

/// Simulates an unreachable cache service: every call fails.
pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(AdherixError::CacheUnavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
        Err(AdherixError::CacheUnavailable("connection refused".into()))
    }

    async fn delete_prefix(&self, _prefix: &str) -> Result<()> {
        Err(AdherixError::CacheUnavailable("connection refused".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryCacheStore::new();
        store
            .set("k1", b"v1".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k1").await.unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.get("k2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let store = MemoryCacheStore::new();
        store
            .set("k1", b"v1".to_vec(), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(store.get("k1").await.unwrap(), None);
        // evicted lazily, not just hidden
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_prefix() {
        let store = MemoryCacheStore::new();
        let ttl = Duration::from_secs(60);
        store.set("features:a:1", b"x".to_vec(), ttl).await.unwrap();
        store.set("features:a:2", b"y".to_vec(), ttl).await.unwrap();
        store.set("features:b:1", b"z".to_vec(), ttl).await.unwrap();

        store.delete_prefix("features:a:").await.unwrap();
        assert_eq!(store.get("features:a:1").await.unwrap(), None);
        assert_eq!(store.get("features:a:2").await.unwrap(), None);
        assert_eq!(store.get("features:b:1").await.unwrap(), Some(b"z".to_vec()));
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let store = MemoryCacheStore::new();
        let ttl = Duration::from_secs(60);
        store.set("k", b"old".to_vec(), ttl).await.unwrap();
        store.set("k", b"new".to_vec(), ttl).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"new".to_vec()));
    }
}
