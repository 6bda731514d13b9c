//! # Orchestrator Providers
//!
//! Provider adapters for the AI orchestrator.
//!
//! Each adapter instance wraps one upstream endpoint/API-key pair and
//! implements the `AiProvider` trait from `orchestrator-core`. Running the
//! same vendor with several keys means registering several adapter
//! instances under distinct provider names.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod openai;

// Re-export main types
pub use openai::{OpenAiCompatibleProvider, OpenAiConfig};
