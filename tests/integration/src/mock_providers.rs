//! Mock AI providers for integration testing
//!
//! Provides in-process scripted providers with call counting, plus helpers
//! for registering them against an orchestrator under test.

use async_trait::async_trait;
use orchestrator_core::{
    AiProvider, CallParams, OrchestratorError, ProviderConfig, ProviderKind, ProviderResponse,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a mock provider does on each call
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always return a successful response with this content
    Succeed(String),
    /// Always return an adapter error
    Fail(String),
    /// Always return a response with `success = false`
    SoftFail(String),
    /// Fail the first N calls, then succeed
    FailFirst(usize),
    /// Succeed after sleeping, to exercise latency tracking
    SucceedAfter(Duration),
}

/// In-process mock provider with a scripted behavior and a call counter
pub struct MockProvider {
    name: String,
    behavior: MockBehavior,
    call_count: AtomicUsize,
}

impl MockProvider {
    /// Create a mock with the given behavior
    pub fn new(name: &str, behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            call_count: AtomicUsize::new(0),
        })
    }

    /// Number of calls this mock has received
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(
        &self,
        _prompt: &str,
        _params: &CallParams,
    ) -> Result<ProviderResponse, OrchestratorError> {
        let n = self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Succeed(content) => Ok(ProviderResponse::success(
                &self.name,
                content.clone(),
                "mock-model",
            )
            .with_tokens_used(42)),
            MockBehavior::Fail(message) => {
                Err(OrchestratorError::provider(&self.name, message.clone()))
            }
            MockBehavior::SoftFail(message) => {
                Ok(ProviderResponse::failure(&self.name, message.clone()))
            }
            MockBehavior::FailFirst(count) => {
                if n < *count {
                    Err(OrchestratorError::provider(&self.name, "scripted failure"))
                } else {
                    Ok(ProviderResponse::success(&self.name, "recovered", "mock-model"))
                }
            }
            MockBehavior::SucceedAfter(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(ProviderResponse::success(&self.name, "slow answer", "mock-model"))
            }
        }
    }
}

/// Provider config with sensible test defaults
pub fn test_config(name: &str, priority: u8) -> ProviderConfig {
    ProviderConfig::new(name, ProviderKind::Custom, priority)
        .with_timeout(Duration::from_secs(5))
}
