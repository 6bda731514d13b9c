//! Provider orchestration: cache check, scored selection, and exhaustive
//! priority-ordered fallback.

use crate::metrics::{MetricsSnapshot, ProviderCounters, UsageCounters};
use orchestrator_core::{
    AiProvider, CallParams, OrchestratorError, ProviderConfig, ProviderResponse,
};
use orchestrator_resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStatus, HealthSnapshot, ProviderHealth,
    ResponseCache, GENERATION_TTL,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Options controlling one orchestrated call
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Cache key for this prompt; `None` disables caching for the call
    pub cache_key: Option<String>,
    /// Whether to consult and populate the cache at all
    pub use_cache: bool,
    /// TTL applied when the response is stored in the cache
    pub cache_ttl: Duration,
    /// Sampling parameters forwarded to the adapter
    pub params: CallParams,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            cache_key: None,
            use_cache: true,
            cache_ttl: GENERATION_TTL,
            params: CallParams::default(),
        }
    }
}

impl CallOptions {
    /// Set the cache key
    #[must_use]
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Disable caching for this call
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Set the cache TTL
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the sampling parameters
    #[must_use]
    pub fn with_params(mut self, params: CallParams) -> Self {
        self.params = params;
        self
    }
}

/// One registered provider with its resilience state
struct RegisteredProvider {
    config: ProviderConfig,
    provider: Arc<dyn AiProvider>,
    breaker: Arc<CircuitBreaker>,
    health: Arc<ProviderHealth>,
    calls: AtomicU64,
    failures: AtomicU64,
}

/// Combined diagnostic view of one registered provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    /// Registration-time configuration
    pub config: ProviderConfig,
    /// Circuit breaker snapshot
    pub breaker: CircuitBreakerStatus,
    /// Health tracker snapshot
    pub health: HealthSnapshot,
    /// Attempts routed to this provider
    pub calls: u64,
    /// Attempts that failed
    pub failures: u64,
}

/// Routes every outbound AI call to the best available provider.
///
/// Holds the provider list (sorted ascending by priority), one circuit
/// breaker and health tracker per provider, and cumulative usage counters.
/// Concurrent `call()` invocations are safe; within one invocation provider
/// attempts are strictly sequential.
pub struct Orchestrator {
    providers: RwLock<Vec<Arc<RegisteredProvider>>>,
    cache: Option<Arc<dyn ResponseCache>>,
    counters: UsageCounters,
}

impl Orchestrator {
    /// Create an orchestrator without a response cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
            cache: None,
            counters: UsageCounters::default(),
        }
    }

    /// Create an orchestrator backed by the given response cache
    #[must_use]
    pub fn with_cache(cache: Arc<dyn ResponseCache>) -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
            cache: Some(cache),
            counters: UsageCounters::default(),
        }
    }

    /// Register a provider with the default breaker configuration.
    ///
    /// # Errors
    /// Returns a configuration error if the config violates its invariants
    /// or the name is already registered.
    pub fn register_provider(
        &self,
        provider: Arc<dyn AiProvider>,
        config: ProviderConfig,
    ) -> Result<(), OrchestratorError> {
        self.register_provider_with_breaker(provider, config, CircuitBreakerConfig::default())
    }

    /// Register a provider with an explicit breaker configuration.
    ///
    /// Multiple API keys for one vendor are registered as separate providers
    /// under distinct names, usually sharing a priority tier.
    ///
    /// # Errors
    /// Returns a configuration error if the config violates its invariants
    /// or the name is already registered.
    pub fn register_provider_with_breaker(
        &self,
        provider: Arc<dyn AiProvider>,
        config: ProviderConfig,
        breaker_config: CircuitBreakerConfig,
    ) -> Result<(), OrchestratorError> {
        config.validate()?;

        let mut providers = self.providers.write();
        if providers.iter().any(|p| p.config.name == config.name) {
            return Err(OrchestratorError::config(format!(
                "provider '{}' is already registered",
                config.name
            )));
        }

        let entry = Arc::new(RegisteredProvider {
            breaker: Arc::new(CircuitBreaker::new(&config.name, breaker_config)),
            health: Arc::new(ProviderHealth::new(
                &config.name,
                config.quota_limit,
                config.enabled,
            )),
            provider,
            calls: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            config,
        });

        info!(
            provider = %entry.config.name,
            priority = entry.config.priority,
            "Provider registered"
        );

        providers.push(entry);
        // Stable sort keeps registration order within a priority tier
        providers.sort_by_key(|p| p.config.priority);
        Ok(())
    }

    /// Execute an orchestrated call.
    ///
    /// Total: every failure path resolves to a response with
    /// `success = false` and a human-readable error; this method never
    /// returns an error to its caller.
    pub async fn call(&self, prompt: &str, options: CallOptions) -> ProviderResponse {
        self.counters.total_requests.fetch_add(1, Ordering::Relaxed);

        let cache_key = options
            .cache_key
            .as_deref()
            .filter(|_| options.use_cache && self.cache.is_some());

        if let Some(key) = cache_key {
            if let Some(response) = self.cache_lookup(key).await {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(cache_key = %key, "Cache hit, no provider contacted");
                return response;
            }
            self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
        }

        // Snapshot under the lock, then run the fallback chain without it
        let providers: Vec<Arc<RegisteredProvider>> = self.providers.read().clone();

        let eligible: Vec<Arc<RegisteredProvider>> = providers
            .into_iter()
            .filter(|p| {
                p.health.is_enabled() && p.breaker.can_request() && p.health.check_quota()
            })
            .collect();

        if eligible.is_empty() {
            warn!("No eligible providers: all disabled, circuit-open, or out of quota");
            return ProviderResponse::failure(
                "none",
                "No providers available: all are disabled, circuit-open, or out of quota",
            );
        }

        self.log_selection(&eligible);

        let mut attempts: u32 = 0;
        let mut last_error = String::new();

        for entry in &eligible {
            // Breaker state may have moved since the eligibility snapshot
            if !entry.breaker.can_request() {
                debug!(provider = %entry.config.name, "Breaker closed the window, skipping");
                continue;
            }

            attempts += 1;
            entry.calls.fetch_add(1, Ordering::Relaxed);

            match self.tracked_call(entry, prompt, &options.params).await {
                Ok(response) => {
                    entry.breaker.record_success();
                    debug!(
                        provider = %entry.config.name,
                        response_time = response.response_time,
                        "Provider call succeeded"
                    );
                    if let Some(key) = cache_key {
                        self.cache_store(key, &response, options.cache_ttl).await;
                    }
                    return response;
                }
                Err(error) => {
                    entry.breaker.record_failure();
                    entry.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        provider = %entry.config.name,
                        error = %error,
                        "Provider call failed, falling back"
                    );
                    last_error = error;
                }
            }
        }

        warn!(attempts = attempts, "All providers failed");
        ProviderResponse::failure("none", "All providers failed")
            .with_metadata("attempts", serde_json::json!(attempts))
            .with_metadata("last_error", serde_json::json!(last_error))
    }

    /// Run one provider attempt with latency tracking.
    ///
    /// The provider's health tracker is updated exactly once per attempt,
    /// on both the success and the failure path. An adapter returning a
    /// response with `success = false` counts as a failure.
    async fn tracked_call(
        &self,
        entry: &RegisteredProvider,
        prompt: &str,
        params: &CallParams,
    ) -> Result<ProviderResponse, String> {
        let started = Instant::now();
        let result = entry.provider.call(prompt, params).await;
        let elapsed = started.elapsed();

        match result {
            Ok(response) if response.success => {
                entry.health.update_success(elapsed);
                Ok(response.with_response_time(elapsed.as_secs_f64()))
            }
            Ok(response) => {
                entry.health.update_failure();
                Err(response
                    .error
                    .unwrap_or_else(|| "provider reported failure without detail".to_string()))
            }
            Err(error) => {
                entry.health.update_failure();
                Err(error.to_string())
            }
        }
    }

    /// Log the best-scored provider. The score orders observability only;
    /// the fallback loop still walks every eligible provider in priority
    /// order, with ties going to the earlier entry.
    fn log_selection(&self, eligible: &[Arc<RegisteredProvider>]) {
        let mut best: Option<(&Arc<RegisteredProvider>, f64)> = None;
        for entry in eligible {
            let score = Self::weighted_score(entry);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((entry, score)),
            }
        }
        if let Some((entry, score)) = best {
            debug!(
                provider = %entry.config.name,
                score = score,
                candidates = eligible.len(),
                "Selected provider"
            );
        }
    }

    /// Selection score: 0.4 health, 0.3 quota headroom, 0.3 latency
    fn weighted_score(entry: &RegisteredProvider) -> f64 {
        0.4 * entry.health.health_score()
            + 0.3 * entry.health.quota_remaining()
            + 0.3 * entry.health.response_time_score()
    }

    async fn cache_lookup(&self, key: &str) -> Option<ProviderResponse> {
        let cache = self.cache.as_ref()?;
        match cache.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<ProviderResponse>(&bytes) {
                Ok(response) => {
                    Some(response.with_metadata("cached", serde_json::json!(true)))
                }
                Err(error) => {
                    warn!(cache_key = %key, error = %error, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                // Cache trouble must never fail the call
                warn!(cache_key = %key, error = %error, "Cache lookup failed");
                None
            }
        }
    }

    async fn cache_store(&self, key: &str, response: &ProviderResponse, ttl: Duration) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        match serde_json::to_vec(response) {
            Ok(bytes) => {
                if let Err(error) = cache.set(key, bytes, ttl).await {
                    warn!(cache_key = %key, error = %error, "Cache store failed");
                }
            }
            Err(error) => {
                warn!(cache_key = %key, error = %error, "Response not cacheable");
            }
        }
    }

    /// Cumulative usage metrics
    #[must_use]
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let providers = self
            .providers
            .read()
            .iter()
            .map(|p| ProviderCounters {
                name: p.config.name.clone(),
                calls: p.calls.load(Ordering::Relaxed),
                failures: p.failures.load(Ordering::Relaxed),
            })
            .collect();
        MetricsSnapshot::from_counters(&self.counters, providers)
    }

    /// Zero all cumulative counters, including per-provider ones.
    /// Breaker and health state are not touched.
    pub fn reset_metrics(&self) {
        self.counters.reset();
        for entry in self.providers.read().iter() {
            entry.calls.store(0, Ordering::Relaxed);
            entry.failures.store(0, Ordering::Relaxed);
        }
    }

    /// Diagnostic snapshot for one provider
    #[must_use]
    pub fn get_provider_status(&self, name: &str) -> Option<ProviderStatus> {
        self.providers
            .read()
            .iter()
            .find(|p| p.config.name == name)
            .map(|p| Self::status_of(p))
    }

    /// Diagnostic snapshots for every provider, in priority order
    #[must_use]
    pub fn get_all_providers_status(&self) -> Vec<ProviderStatus> {
        self.providers.read().iter().map(|p| Self::status_of(p)).collect()
    }

    /// Administratively enable or disable a provider.
    /// Returns false if no provider has that name.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let providers = self.providers.read();
        match providers.iter().find(|p| p.config.name == name) {
            Some(entry) => {
                entry.health.set_enabled(enabled);
                info!(provider = %name, enabled = enabled, "Provider toggled");
                true
            }
            None => false,
        }
    }

    /// Force a provider's breaker back to closed (operator action).
    /// Returns false if no provider has that name.
    pub fn reset_breaker(&self, name: &str) -> bool {
        let providers = self.providers.read();
        match providers.iter().find(|p| p.config.name == name) {
            Some(entry) => {
                entry.breaker.reset();
                true
            }
            None => false,
        }
    }

    /// Store the remaining quota fraction reported by the adapter layer.
    /// Returns false if no provider has that name.
    pub fn update_quota_remaining(&self, name: &str, fraction: f64) -> bool {
        let providers = self.providers.read();
        match providers.iter().find(|p| p.config.name == name) {
            Some(entry) => {
                entry.health.update_quota_remaining(fraction);
                true
            }
            None => false,
        }
    }

    fn status_of(entry: &RegisteredProvider) -> ProviderStatus {
        ProviderStatus {
            config: entry.config.clone(),
            breaker: entry.breaker.status(),
            health: entry.health.snapshot(),
            calls: entry.calls.load(Ordering::Relaxed),
            failures: entry.failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
