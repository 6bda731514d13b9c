//! Per-provider health and quota tracking.
//!
//! Each registered provider owns one [`ProviderHealth`] that accumulates
//! success/failure counts, an exponential moving average of latency, and an
//! externally reported quota-remaining fraction. The tracker condenses these
//! into a deterministic `health_score` in [0, 1] that the orchestrator uses
//! to rank providers: two trackers fed identical histories always produce
//! identical scores.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Consecutive failures after which a provider is considered unhealthy
/// until its next success
const UNHEALTHY_CONSECUTIVE_FAILURES: u32 = 5;

/// Minimum health score below which a provider is considered unhealthy
const MIN_HEALTHY_SCORE: f64 = 0.3;

/// EMA smoothing: weight kept by the old average
const EMA_OLD_WEIGHT: f64 = 0.7;
/// EMA smoothing: weight given to the new sample
const EMA_NEW_WEIGHT: f64 = 0.3;

/// Mutable health state, guarded by the tracker's mutex
#[derive(Debug)]
struct HealthState {
    total_requests: u64,
    success_count: u64,
    failure_count: u64,
    consecutive_failures: u32,
    avg_latency_secs: f64,
    quota_remaining: f64,
    enabled: bool,
    healthy: bool,
    health_score: f64,
    last_success: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
}

/// Rolling reliability, latency, and capacity signal for one provider.
///
/// All mutations go through a per-provider mutex so concurrent orchestrator
/// calls never lose counter updates.
pub struct ProviderHealth {
    provider_name: String,
    /// Quota allowance in provider-specific units; 0 = unlimited
    quota_limit: u64,
    state: Mutex<HealthState>,
}

/// Read-only serializable view of a provider's health
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    /// Provider this snapshot describes
    pub provider_name: String,
    /// Total call attempts observed
    pub total_requests: u64,
    /// Successful attempts
    pub success_count: u64,
    /// Failed attempts
    pub failure_count: u64,
    /// Current consecutive-failure streak
    pub consecutive_failures: u32,
    /// Exponential moving average of attempt latency, seconds
    pub avg_latency_secs: f64,
    /// Remaining quota fraction in [0, 1]
    pub quota_remaining: f64,
    /// Configured quota allowance (0 = unlimited)
    pub quota_limit: u64,
    /// Whether the provider is administratively enabled
    pub enabled: bool,
    /// Derived health score in [0, 1]
    pub health_score: f64,
    /// Whether the provider currently counts as healthy
    pub is_healthy: bool,
    /// Timestamp of the most recent success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    /// Timestamp of the most recent failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<DateTime<Utc>>,
}

impl ProviderHealth {
    /// Create a fresh tracker. A provider with no history scores 1.0.
    #[must_use]
    pub fn new(provider_name: impl Into<String>, quota_limit: u64, enabled: bool) -> Self {
        let mut state = HealthState {
            total_requests: 0,
            success_count: 0,
            failure_count: 0,
            consecutive_failures: 0,
            avg_latency_secs: 0.0,
            quota_remaining: 1.0,
            enabled,
            healthy: true,
            health_score: 1.0,
            last_success: None,
            last_failure: None,
        };
        state.health_score = Self::compute_score(&state);

        Self {
            provider_name: provider_name.into(),
            quota_limit,
            state: Mutex::new(state),
        }
    }

    /// Record a successful attempt with its measured latency
    pub fn update_success(&self, latency: Duration) {
        let mut state = self.state.lock();
        state.total_requests += 1;
        state.success_count += 1;
        state.consecutive_failures = 0;
        state.healthy = true;
        state.last_success = Some(Utc::now());

        let sample = latency.as_secs_f64();
        state.avg_latency_secs = if state.avg_latency_secs == 0.0 {
            sample
        } else {
            EMA_OLD_WEIGHT * state.avg_latency_secs + EMA_NEW_WEIGHT * sample
        };

        state.health_score = Self::compute_score(&state);
        debug!(
            provider = %self.provider_name,
            latency_secs = sample,
            score = state.health_score,
            "Provider success recorded"
        );
    }

    /// Record a failed attempt
    pub fn update_failure(&self) {
        let mut state = self.state.lock();
        state.total_requests += 1;
        state.failure_count += 1;
        state.consecutive_failures += 1;
        state.last_failure = Some(Utc::now());

        if state.consecutive_failures >= UNHEALTHY_CONSECUTIVE_FAILURES && state.healthy {
            state.healthy = false;
            warn!(
                provider = %self.provider_name,
                consecutive_failures = state.consecutive_failures,
                "Provider marked unhealthy"
            );
        }

        state.health_score = Self::compute_score(&state);
    }

    /// Store the remaining quota fraction reported by the adapter layer.
    ///
    /// Quota accounting units are provider-specific; the tracker only keeps
    /// the normalized fraction for scoring.
    pub fn update_quota_remaining(&self, fraction: f64) {
        let mut state = self.state.lock();
        state.quota_remaining = fraction.clamp(0.0, 1.0);
        state.health_score = Self::compute_score(&state);
    }

    /// Administratively enable or disable the provider
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        state.enabled = enabled;
    }

    /// Whether the provider may be used at all
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        let state = self.state.lock();
        state.enabled
            && self.quota_available(&state)
            && state.consecutive_failures < UNHEALTHY_CONSECUTIVE_FAILURES
            && state.health_score >= MIN_HEALTHY_SCORE
    }

    /// Whether the provider is administratively enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Whether quota remains (always true for unlimited providers)
    #[must_use]
    pub fn check_quota(&self) -> bool {
        let state = self.state.lock();
        self.quota_available(&state)
    }

    /// Current derived health score in [0, 1]
    #[must_use]
    pub fn health_score(&self) -> f64 {
        self.state.lock().health_score
    }

    /// Current remaining quota fraction
    #[must_use]
    pub fn quota_remaining(&self) -> f64 {
        self.state.lock().quota_remaining
    }

    /// Latency component of the score: 1.0 at 0s, 0.0 from 10s up
    #[must_use]
    pub fn response_time_score(&self) -> f64 {
        let state = self.state.lock();
        Self::latency_score(state.avg_latency_secs)
    }

    /// Read-only snapshot for status endpoints and logs
    #[must_use]
    pub fn snapshot(&self) -> HealthSnapshot {
        let state = self.state.lock();
        HealthSnapshot {
            provider_name: self.provider_name.clone(),
            total_requests: state.total_requests,
            success_count: state.success_count,
            failure_count: state.failure_count,
            consecutive_failures: state.consecutive_failures,
            avg_latency_secs: state.avg_latency_secs,
            quota_remaining: state.quota_remaining,
            quota_limit: self.quota_limit,
            enabled: state.enabled,
            health_score: state.health_score,
            is_healthy: state.enabled
                && self.quota_available(&state)
                && state.consecutive_failures < UNHEALTHY_CONSECUTIVE_FAILURES
                && state.health_score >= MIN_HEALTHY_SCORE,
            last_success: state.last_success,
            last_failure: state.last_failure,
        }
    }

    fn quota_available(&self, state: &HealthState) -> bool {
        self.quota_limit == 0 || state.quota_remaining > 0.0
    }

    fn latency_score(avg_latency_secs: f64) -> f64 {
        (1.0 - avg_latency_secs / 10.0).max(0.0)
    }

    /// Weighted score: 0.5 success rate, 0.3 latency, 0.2 quota headroom,
    /// minus a consecutive-failure penalty capped at 0.5, clamped to [0, 1].
    fn compute_score(state: &HealthState) -> f64 {
        let success_rate = if state.total_requests == 0 {
            1.0
        } else {
            state.success_count as f64 / state.total_requests as f64
        };
        let latency_score = Self::latency_score(state.avg_latency_secs);
        let penalty = (0.1 * f64::from(state.consecutive_failures)).min(0.5);

        (0.5 * success_rate + 0.3 * latency_score + 0.2 * state.quota_remaining - penalty)
            .clamp(0.0, 1.0)
    }
}
