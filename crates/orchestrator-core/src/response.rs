//! The uniform response shape returned by every provider adapter
//! and by the orchestrator itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of one provider call attempt.
///
/// Ephemeral: the core never persists these, but successful responses are
/// serialized into the response cache by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Name of the provider that produced this response
    /// ("none" for synthetic failures when no provider was usable)
    pub provider_name: String,

    /// Generated text content (empty on failure)
    pub content: String,

    /// Model identifier reported by the provider
    #[serde(default)]
    pub model: String,

    /// Whether the call succeeded
    pub success: bool,

    /// Human-readable failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Token or character usage reported by the provider, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,

    /// Measured wall-clock latency of the attempt, in seconds
    #[serde(default)]
    pub response_time: f64,

    /// When the response was produced
    pub timestamp: DateTime<Utc>,

    /// Free-form metadata (cache flags, attempt counts, vendor extras)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ProviderResponse {
    /// Build a successful response
    #[must_use]
    pub fn success(
        provider_name: impl Into<String>,
        content: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            content: content.into(),
            model: model.into(),
            success: true,
            error: None,
            tokens_used: None,
            response_time: 0.0,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Build a failed response
    #[must_use]
    pub fn failure(provider_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            content: String::new(),
            model: String::new(),
            success: false,
            error: Some(error.into()),
            tokens_used: None,
            response_time: 0.0,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Set the reported token usage
    #[must_use]
    pub fn with_tokens_used(mut self, tokens: u32) -> Self {
        self.tokens_used = Some(tokens);
        self
    }

    /// Set the measured latency in seconds
    #[must_use]
    pub fn with_response_time(mut self, seconds: f64) -> Self {
        self.response_time = seconds;
        self
    }

    /// Attach a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
