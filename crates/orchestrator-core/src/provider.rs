//! The provider adapter trait.
//!
//! Every vendor integration implements [`AiProvider`]; the orchestrator
//! depends only on this trait and never on concrete vendor types.

use crate::error::OrchestratorError;
use crate::response::ProviderResponse;
use crate::types::CallParams;
use async_trait::async_trait;

/// Uniform capability over a vendor-specific AI client.
///
/// Contract: `call` must surface every failure, either as an `Err` or as a
/// response with `success = false` — never as a silently truncated success.
/// The adapter is responsible for enforcing its configured network timeout.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// The registered provider name this adapter serves
    fn name(&self) -> &str;

    /// Send a prompt upstream and return the generated text.
    ///
    /// # Errors
    /// Returns an error on network failure, vendor error, timeout, or a
    /// malformed upstream response.
    async fn call(
        &self,
        prompt: &str,
        params: &CallParams,
    ) -> Result<ProviderResponse, OrchestratorError>;
}
