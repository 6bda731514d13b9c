//! # Orchestrator Routing
//!
//! The AI provider orchestrator: given a prompt, it answers from cache when
//! possible, otherwise selects the best available provider and falls back
//! through the remaining ranked chain on failure, updating each provider's
//! circuit breaker and health tracker along the way.
//!
//! The orchestrator is constructed once at process start and shared by
//! `Arc`; it lives for the process lifetime and needs no explicit teardown.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod metrics;
pub mod orchestrator;

// Re-export main types
pub use metrics::{MetricsSnapshot, ProviderCounters};
pub use orchestrator::{CallOptions, Orchestrator, ProviderStatus};
