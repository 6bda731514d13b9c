//! Circuit breaker pattern implementation.
//!
//! One breaker guards one registered provider: after repeated failures it
//! stops the orchestrator from sending requests to that provider, then
//! periodically lets a trial request through to detect recovery.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally
    Closed = 0,
    /// Circuit is open, requests are rejected
    Open = 1,
    /// Circuit is half-open, testing if the provider recovered
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Open,
            2 => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures while closed before opening the circuit
    pub failure_threshold: u32,
    /// Successes in half-open required to close the circuit
    pub success_threshold: u32,
    /// Time to wait in open before allowing a trial request
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Circuit breaker for a single provider.
///
/// State lives in atomics so `can_request` stays lock-free on the hot path;
/// transitions serialize on a write lock.
pub struct CircuitBreaker {
    /// Provider this breaker guards
    provider_name: String,
    /// Configuration
    config: CircuitBreakerConfig,
    /// Current state
    state: AtomicU8,
    /// Failure count, meaningful while closed
    failure_count: AtomicU32,
    /// Success count, meaningful while half-open
    success_count: AtomicU32,
    /// When the circuit opened (milliseconds since epoch, 0 = never)
    opened_at: AtomicU64,
    /// Last recorded failure (milliseconds since epoch, 0 = never)
    last_failure_at: AtomicU64,
    /// Lock for state transitions
    transition_lock: RwLock<()>,
}

/// Read-only diagnostic snapshot of a breaker
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStatus {
    /// Current state
    pub state: CircuitState,
    /// Failure count in the closed state
    pub failure_count: u32,
    /// Success count in the half-open state
    pub success_count: u32,
    /// Configured failure threshold
    pub failure_threshold: u32,
    /// Configured success threshold
    pub success_threshold: u32,
    /// Configured open-state timeout in seconds
    pub timeout_secs: u64,
    /// Seconds since the circuit opened, when open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_since_opened: Option<f64>,
    /// Seconds until a trial request is allowed, when open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_until_retry: Option<f64>,
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(provider_name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            provider_name: provider_name.into(),
            config,
            state: AtomicU8::new(CircuitState::Closed as u8),
            failure_count: AtomicU32::new(0),
            success_count: AtomicU32::new(0),
            opened_at: AtomicU64::new(0),
            last_failure_at: AtomicU64::new(0),
            transition_lock: RwLock::new(()),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(provider_name: impl Into<String>) -> Self {
        Self::new(provider_name, CircuitBreakerConfig::default())
    }

    /// Get the guarded provider's name
    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Get the current state
    #[must_use]
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Whether a request may be sent to the guarded provider.
    ///
    /// In the open state, once the configured timeout has elapsed this call
    /// itself performs the open → half-open transition and returns true, so
    /// the caller that observed the elapsed timeout carries the trial
    /// request.
    pub fn can_request(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                if self.open_timeout_elapsed() {
                    self.transition_to_half_open();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful request
    pub fn record_success(&self) {
        match self.state() {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Relaxed);
            }
            CircuitState::HalfOpen => {
                let successes = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    provider = %self.provider_name,
                    successes = successes,
                    threshold = self.config.success_threshold,
                    "Circuit breaker half-open success"
                );

                if successes >= self.config.success_threshold {
                    self.transition_to_closed();
                }
            }
            CircuitState::Open => {
                // Not reachable through the orchestrator, which checks
                // can_request first; state is left untouched.
                warn!(
                    provider = %self.provider_name,
                    "Success recorded while circuit open, ignoring"
                );
            }
        }
    }

    /// Record a failed request
    pub fn record_failure(&self) {
        self.last_failure_at.store(now_millis(), Ordering::Relaxed);

        match self.state() {
            CircuitState::Closed => {
                let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;

                if failures >= self.config.failure_threshold {
                    debug!(
                        provider = %self.provider_name,
                        failures = failures,
                        threshold = self.config.failure_threshold,
                        "Circuit breaker failure threshold reached"
                    );
                    self.transition_to_open();
                }
            }
            CircuitState::HalfOpen => {
                // A failed trial request reopens the circuit immediately
                debug!(
                    provider = %self.provider_name,
                    "Circuit breaker half-open failure, reopening"
                );
                self.transition_to_open();
            }
            CircuitState::Open => {
                warn!(
                    provider = %self.provider_name,
                    "Failure recorded while circuit open, ignoring"
                );
            }
        }
    }

    /// Reset the breaker to closed with all counters zeroed.
    ///
    /// Administrative override; normal recovery goes through half-open.
    pub fn reset(&self) {
        self.transition_to_closed();
    }

    /// Whether the open-state timeout has elapsed (inclusive boundary)
    fn open_timeout_elapsed(&self) -> bool {
        let opened_at = self.opened_at.load(Ordering::Acquire);
        if opened_at == 0 {
            return false;
        }
        let elapsed = now_millis().saturating_sub(opened_at);
        elapsed >= self.config.timeout.as_millis() as u64
    }

    fn transition_to_open(&self) {
        let _guard = self.transition_lock.write();

        let prev_state = self.state.swap(CircuitState::Open as u8, Ordering::Release);
        self.opened_at.store(now_millis(), Ordering::Release);
        self.success_count.store(0, Ordering::Relaxed);

        if prev_state != CircuitState::Open as u8 {
            warn!(
                provider = %self.provider_name,
                failures = self.failure_count.load(Ordering::Relaxed),
                "Circuit breaker opened"
            );
        }
    }

    fn transition_to_half_open(&self) {
        let _guard = self.transition_lock.write();

        // Only move if still open; another caller may have raced us here
        if self
            .state
            .compare_exchange(
                CircuitState::Open as u8,
                CircuitState::HalfOpen as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.success_count.store(0, Ordering::Relaxed);

            info!(
                provider = %self.provider_name,
                "Circuit breaker half-open, allowing trial requests"
            );
        }
    }

    fn transition_to_closed(&self) {
        let _guard = self.transition_lock.write();

        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);
        self.failure_count.store(0, Ordering::Relaxed);
        self.success_count.store(0, Ordering::Relaxed);
        self.opened_at.store(0, Ordering::Release);

        info!(
            provider = %self.provider_name,
            "Circuit breaker closed"
        );
    }

    /// Get a diagnostic snapshot
    #[must_use]
    pub fn status(&self) -> CircuitBreakerStatus {
        let state = self.state();
        let (time_since_opened, time_until_retry) = if state == CircuitState::Open {
            let opened_at = self.opened_at.load(Ordering::Acquire);
            let elapsed = now_millis().saturating_sub(opened_at) as f64 / 1000.0;
            let remaining = (self.config.timeout.as_secs_f64() - elapsed).max(0.0);
            (Some(elapsed), Some(remaining))
        } else {
            (None, None)
        };

        CircuitBreakerStatus {
            state,
            failure_count: self.failure_count.load(Ordering::Relaxed),
            success_count: self.success_count.load(Ordering::Relaxed),
            failure_threshold: self.config.failure_threshold,
            success_threshold: self.config.success_threshold,
            timeout_secs: self.config.timeout.as_secs(),
            time_since_opened,
            time_until_retry,
        }
    }
}
