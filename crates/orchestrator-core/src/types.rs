//! Provider configuration and call parameter types.

use crate::error::OrchestratorError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Kind of upstream provider behind an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI or any API exposing the chat-completions wire format
    OpenAiCompatible,
    /// Anthropic Claude
    Anthropic,
    /// Google Gemini
    Google,
    /// Anything else (self-hosted, test doubles)
    Custom,
}

/// Immutable per-provider configuration, fixed at registration time.
///
/// Multiple API keys for one vendor are registered as multiple providers
/// with distinct names, usually sharing a priority tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider identifier (e.g. "openai-key-1")
    pub name: String,

    /// Provider kind tag
    pub kind: ProviderKind,

    /// Selection priority, 1 (most preferred) to 10
    pub priority: u8,

    /// Daily quota allowance in provider-specific units
    /// (requests or characters); 0 means unlimited
    pub quota_limit: u64,

    /// Network timeout for a single call attempt
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Advisory retry budget for the adapter; not enforced by the
    /// orchestrator, which falls back across providers instead
    pub max_retries: u32,

    /// Disabled providers are never eligible for selection
    pub enabled: bool,
}

impl ProviderConfig {
    /// Create a configuration with product defaults
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ProviderKind, priority: u8) -> Self {
        Self {
            name: name.into(),
            kind,
            priority,
            quota_limit: 0,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            enabled: true,
        }
    }

    /// Set the daily quota limit (0 = unlimited)
    #[must_use]
    pub fn with_quota_limit(mut self, limit: u64) -> Self {
        self.quota_limit = limit;
        self
    }

    /// Set the per-attempt network timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the advisory retry budget
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Enable or disable the provider
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate registration invariants.
    ///
    /// # Errors
    /// Returns `OrchestratorError::Config` if the priority is outside
    /// [1, 10] or the timeout is below one second.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.name.trim().is_empty() {
            return Err(OrchestratorError::config("provider name cannot be empty"));
        }
        if !(1..=10).contains(&self.priority) {
            return Err(OrchestratorError::config(format!(
                "priority must be between 1 and 10, got {}",
                self.priority
            )));
        }
        if self.timeout < Duration::from_secs(1) {
            return Err(OrchestratorError::config(format!(
                "timeout must be at least 1s, got {:?}",
                self.timeout
            )));
        }
        Ok(())
    }
}

/// Sampling and generation parameters passed through to the adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallParams {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Provider-specific extra parameters, forwarded opaquely
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CallParams {
    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max token budget
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Serialize `Duration` as whole seconds for config round-trips
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
