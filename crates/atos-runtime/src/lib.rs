//! # atos-runtime
//!
//! Optional conversational layer for ATOS.
//!
//! ## Important
//!
//! This crate is OPTIONAL. Guidance from `atos-core` is fully deterministic
//! and never calls a text-generation service. This crate adds a chat
//! surface on top that:
//! - Sends the case snapshot and ranked findings to an OpenAI-compatible
//!   chat-completion endpoint when a credential is configured
//! - Falls back to the deterministic narrative on any failure
//! - Never returns an error or an empty reply to the caller
//!
//! ## Example
//!
//! ```rust,ignore
//! use atos_runtime::{ConversationalAdapter, ConversationSession};
//! use atos_core::{CaseSnapshot, Module};
//!
//! let adapter = ConversationalAdapter::from_env();
//! let snapshot = CaseSnapshot::from_json_file("case.json")?;
//! let mut session = ConversationSession::new(Module::Insurance);
//!
//! let reply = session.ask(&adapter, &snapshot, "What should we do next?").await;
//! println!("{} ({:?})", reply.message, reply.confidence);
//! ```

use thiserror::Error;

pub mod adapter;
pub mod config;
pub mod extraction;
pub mod fallback;
pub mod grounding;
pub mod prompts;
pub mod providers;
pub mod session;

pub use adapter::{
    ConversationRequest, ConversationalAdapter, ConversationalResponse, ResponseConfidence,
    ResponseSource,
};
pub use config::RuntimeConfig;
pub use extraction::InsightMarker;
pub use fallback::FallbackReason;
pub use providers::{
    ChatMessage, Completion, CompletionConfig, LlmProvider, ProviderError, ProviderRegistry, Role,
};
pub use session::ConversationSession;

use atos_core::{CaseSnapshot, Module};

/// Errors from the runtime layer.
///
/// Only configuration and provider construction can fail; answering a
/// question never does.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// One-shot conversational answer using environment configuration.
pub async fn generate_response(
    module: Module,
    snapshot: &CaseSnapshot,
    message: Option<&str>,
    history: &[ChatMessage],
) -> ConversationalResponse {
    ConversationalAdapter::from_env()
        .respond(ConversationRequest::new(module, snapshot, message.unwrap_or_default()).with_history(history))
        .await
}
