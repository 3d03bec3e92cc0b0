//! adherix-cache — Feature vector caching with TTL and data-version keying.
//!
//! A performance cache, not a correctness-critical store: two
//! concurrent requests for the same uncached patient may both compute
//! and both write (last write wins), and a lost entry only costs a
//! recompute. Store outages degrade to always-compute.

pub mod feature_cache;
pub mod store;

pub use feature_cache::{CacheLookup, FeatureCache};
pub use store::{CacheStore, FailingCacheStore, MemoryCacheStore};
