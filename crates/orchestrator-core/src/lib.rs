//! # Orchestrator Core
//!
//! Core types, traits, and error handling for the AI provider orchestrator.
//!
//! This crate provides the foundational types used throughout the
//! orchestration layer:
//! - Provider configuration and call parameters
//! - The uniform provider response shape
//! - The `AiProvider` trait that every adapter implements
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod provider;
pub mod response;
pub mod types;

// Re-export commonly used types
pub use error::{OrchestratorError, OrchestratorResult};
pub use provider::AiProvider;
pub use response::ProviderResponse;
pub use types::{CallParams, ProviderConfig, ProviderKind};
