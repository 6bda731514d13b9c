//! Cumulative orchestrator usage counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-lifetime request and cache counters, mutated from concurrent
/// calls via atomics
#[derive(Debug, Default)]
pub(crate) struct UsageCounters {
    pub total_requests: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
}

impl UsageCounters {
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }
}

/// Per-provider call and failure counts
#[derive(Debug, Clone, Serialize)]
pub struct ProviderCounters {
    /// Provider name
    pub name: String,
    /// Attempts routed to this provider
    pub calls: u64,
    /// Attempts that failed
    pub failures: u64,
}

/// Point-in-time view of the orchestrator's cumulative metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Total `call()` invocations, including cache hits
    pub total_requests: u64,
    /// Cache lookups that returned a stored response
    pub cache_hits: u64,
    /// Cache lookups that missed
    pub cache_misses: u64,
    /// Hits over total lookups, 0.0 when no lookups happened
    pub cache_hit_rate: f64,
    /// Per-provider counters, in priority order
    pub providers: Vec<ProviderCounters>,
}

impl MetricsSnapshot {
    pub(crate) fn from_counters(
        counters: &UsageCounters,
        providers: Vec<ProviderCounters>,
    ) -> Self {
        let hits = counters.cache_hits.load(Ordering::Relaxed);
        let misses = counters.cache_misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let cache_hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };

        Self {
            total_requests: counters.total_requests.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            providers,
        }
    }
}
