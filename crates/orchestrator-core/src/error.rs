//! Error types for the orchestration layer.
//!
//! Errors circulate internally as `Result<T, OrchestratorError>`; the
//! orchestrator's public `call()` converts every failure into a
//! `ProviderResponse` with `success = false` before it reaches a caller.

use std::time::Duration;
use thiserror::Error;

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Errors produced by the orchestration layer and its provider adapters
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid provider configuration, fatal to that registration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// A provider attempt failed (vendor error, malformed response, network)
    #[error("Provider '{provider}' failed: {message}")]
    Provider {
        /// Provider that failed
        provider: String,
        /// Failure detail
        message: String,
    },

    /// A provider attempt exceeded its configured timeout
    #[error("Provider '{provider}' timed out after {timeout:?}")]
    Timeout {
        /// Provider that timed out
        provider: String,
        /// The configured timeout
        timeout: Duration,
    },

    /// Cache backend failure (never surfaced to callers, logged only)
    #[error("Cache error: {0}")]
    Cache(String),

    /// Response payload could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OrchestratorError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a provider failure error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a provider timeout error
    pub fn timeout(provider: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout,
        }
    }

    /// Whether this error counts as a provider attempt failure
    /// (as opposed to a configuration or cache problem)
    #[must_use]
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Timeout { .. })
    }
}
