//! Chat-completion backends.
//!
//! The adapter sends a case conversation to a text-generation service only
//! through [`LlmProvider`]. Backends are looked up by name in a
//! [`ProviderRegistry`]; the OpenAI-compatible one is compiled in with the
//! `openai` feature.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod registry;
pub mod secrets;

#[cfg(feature = "openai")]
mod openai;

pub use registry::{BackendBuilder, ProviderRegistry};
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "openai")]
pub use openai::OpenAiCompatibleProvider;

/// Default chat-completion endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Why a completion could not be used.
///
/// Every variant ends in a deterministic fallback; none reaches the caller
/// of [`crate::ConversationalAdapter::respond`].
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request could not be sent: {0}")]
    Transport(String),

    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unreadable completion body: {0}")]
    Malformed(String),

    #[error("Credential rejected by the service")]
    Unauthorized,

    #[error("No completion within {0:?}")]
    Timeout(Duration),

    #[error("Completion contained no text")]
    EmptyCompletion,

    #[error("Backend not configured: {0}")]
    NotConfigured(String),
}

/// Per-request generation settings.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub model: String,

    pub max_tokens: u32,

    pub temperature: f32,

    /// Bound on the whole round trip
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        crate::config::RuntimeConfig::default().completion_config()
    }
}

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a case conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Text returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,

    /// Model the service reports having used
    pub model: String,

    /// Prompt plus completion tokens, when the service reports them
    pub tokens: Option<u32>,
}

/// A text-generation backend.
///
/// The deterministic engine never calls this; only the adapter does.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: &CompletionConfig,
    ) -> Result<Completion, ProviderError>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("Request a re-inspection.")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(ChatMessage::system("rules").role, Role::System);
    }

    #[test]
    fn test_completion_defaults_follow_runtime_defaults() {
        let config = CompletionConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
