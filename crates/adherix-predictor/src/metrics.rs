//! Process-local counters for prediction throughput and degradations.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lock-free counters shared by all concurrent requests.
#[derive(Debug, Default)]
pub struct PredictorMetrics {
    predictions_total: AtomicU64,
    failures_total: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_errors: AtomicU64,
    attribution_failures: AtomicU64,
    persistence_failures: AtomicU64,
    latency_ms_total: AtomicU64,
}

impl PredictorMetrics {
    pub fn record_success(&self, latency_ms: u64) {
        self.predictions_total.fetch_add(1, Ordering::Relaxed);
        self.latency_ms_total.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A store outage or corrupt entry, as opposed to a cold key.
    pub fn record_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attribution_failure(&self) {
        self.attribution_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_failure(&self) {
        self.persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.predictions_total.load(Ordering::Relaxed);
        let latency_total = self.latency_ms_total.load(Ordering::Relaxed);
        MetricsSnapshot {
            predictions_total: total,
            failures_total: self.failures_total.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            attribution_failures: self.attribution_failures.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            avg_latency_ms: if total == 0 {
                0.0
            } else {
                latency_total as f64 / total as f64
            },
        }
    }
}

/// Point-in-time view, serialized by the metrics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_total: u64,
    pub failures_total: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_errors: u64,
    pub attribution_failures: u64,
    pub persistence_failures: u64,
    pub avg_latency_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = PredictorMetrics::default();
        metrics.record_success(10);
        metrics.record_success(30);
        metrics.record_cache_hit();
        metrics.record_cache_error();
        metrics.record_failure();

        let snap = metrics.snapshot();
        assert_eq!(snap.predictions_total, 2);
        assert_eq!(snap.failures_total, 1);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.cache_errors, 1);
        assert!((snap.avg_latency_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot_has_zero_latency() {
        let snap = PredictorMetrics::default().snapshot();
        assert_eq!(snap.avg_latency_ms, 0.0);
    }
}
