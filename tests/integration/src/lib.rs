//! Integration tests for the AI provider orchestrator
//!
//! This crate provides integration tests covering:
//! - Circuit breaker behavior under forced failure sequences
//! - Provider health and quota scoring
//! - Fallback-chain execution across ranked providers
//! - Caching behavior and response round-trips

pub mod mock_providers;

// Re-export commonly used items
pub use mock_providers::*;

#[cfg(test)]
mod cache_tests;
#[cfg(test)]
mod orchestrator_tests;
