//! # Orchestrator Resilience
//!
//! Fault-isolation and capacity-tracking primitives for the AI orchestrator:
//! - Circuit breaker for isolating persistently failing providers
//! - Per-provider health and quota tracking
//! - Response cache backend abstraction with an in-memory implementation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod circuit_breaker;
pub mod health;

// Re-export main types
pub use cache::{cache_key, CacheError, CacheResult, MemoryCache, ResponseCache, EVALUATION_TTL, GENERATION_TTL};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStatus, CircuitState};
pub use health::{HealthSnapshot, ProviderHealth};
