//! Conversational adapter.
//!
//! Wraps the deterministic engine with an optional chat-completion call.
//! `respond` never fails: a missing credential, a provider error, a timeout,
//! an empty completion, or (with strict grounding) an ungrounded figure all
//! resolve to the deterministic fallback for the same module.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use atos_core::{generate_guidance, CaseSnapshot, Composer, GuidanceItem, Module};

use crate::config::RuntimeConfig;
use crate::extraction::{extract_actions, extract_insights, InsightMarker};
use crate::fallback::{fallback_response, FallbackReason};
use crate::grounding::check_grounding;
use crate::prompts::build_messages;
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError, ProviderRegistry};
use crate::RuntimeError;

/// One conversational turn.
#[derive(Debug, Clone, Copy)]
pub struct ConversationRequest<'a> {
    pub message: &'a str,

    pub module: Module,

    pub snapshot: &'a CaseSnapshot,

    /// Prior turns, oldest first
    pub history: &'a [ChatMessage],
}

impl<'a> ConversationRequest<'a> {
    pub fn new(module: Module, snapshot: &'a CaseSnapshot, message: &'a str) -> Self {
        Self {
            message,
            module,
            snapshot,
            history: &[],
        }
    }

    pub fn with_history(mut self, history: &'a [ChatMessage]) -> Self {
        self.history = history;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseConfidence {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Service,
    Fallback,
}

/// Reply for one turn. `message` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationalResponse {
    pub message: String,

    pub insights: Vec<InsightMarker>,

    pub actions: Vec<String>,

    pub confidence: ResponseConfidence,

    pub source: ResponseSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl ConversationalResponse {
    pub fn is_fallback(&self) -> bool {
        self.source == ResponseSource::Fallback
    }
}

/// Engine plus optional chat-completion provider.
pub struct ConversationalAdapter {
    provider: Option<Arc<dyn LlmProvider>>,
    completion: CompletionConfig,
    strict_grounding: bool,
    composer: Composer,
}

impl ConversationalAdapter {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
            strict_grounding: false,
            composer: Composer::new(),
        }
    }

    /// Adapter that always serves deterministic guidance.
    pub fn deterministic() -> Self {
        Self::new(None, CompletionConfig::default())
    }

    /// Build from runtime configuration with the built-in backends.
    ///
    /// A backend that cannot be built (no credential, or a backend this
    /// build does not include) leaves the adapter deterministic.
    pub fn from_config(config: RuntimeConfig) -> Self {
        let registry = ProviderRegistry::with_defaults();
        match Self::from_registry(&registry, &config) {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::debug!(backend = %config.backend, error = %e, "No chat backend, serving deterministic guidance");
                Self::new(None, config.completion_config()).with_strict_grounding(config.strict_grounding)
            }
        }
    }

    /// Read configuration from the environment.
    ///
    /// A malformed value is logged and the adapter falls back to
    /// deterministic guidance rather than failing.
    pub fn from_env() -> Self {
        match RuntimeConfig::from_env() {
            Ok(config) => Self::from_config(config),
            Err(e) => {
                tracing::warn!(error = %e, "Invalid runtime configuration, serving deterministic guidance");
                Self::deterministic()
            }
        }
    }

    /// Build with the backend `config.backend` names in `registry`.
    pub fn from_registry(registry: &ProviderRegistry, config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let provider = registry.build(&config)?;
        tracing::debug!(backend = %config.backend, provider = provider.name(), "Chat backend ready");
        Ok(Self::new(Some(provider), config.completion_config()).with_strict_grounding(config.strict_grounding))
    }

    pub fn with_strict_grounding(mut self, strict: bool) -> Self {
        self.strict_grounding = strict;
        self
    }

    pub fn with_composer(mut self, composer: Composer) -> Self {
        self.composer = composer;
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Answer one turn.
    pub async fn respond(&self, request: ConversationRequest<'_>) -> ConversationalResponse {
        let module = request.module;
        let ranked = generate_guidance(module, request.snapshot);

        let Some(provider) = &self.provider else {
            tracing::debug!(module = ?module, "No completion credential, serving deterministic guidance");
            return self.fallback(&ranked, request.message, FallbackReason::NotConfigured);
        };

        let messages = build_messages(
            module,
            request.snapshot,
            &ranked,
            request.history,
            request.message,
        );
        let timeout = self.completion.timeout;

        match tokio::time::timeout(timeout, provider.complete(&messages, &self.completion)).await {
            Ok(Ok(completion)) => {
                tracing::debug!(
                    module = ?module,
                    provider = provider.name(),
                    model = %completion.model,
                    tokens = ?completion.tokens,
                    "Completion received"
                );
                self.accept(request, &ranked, completion.text)
            }
            Ok(Err(ProviderError::EmptyCompletion)) => {
                tracing::warn!(module = ?module, provider = provider.name(), "Empty completion, falling back");
                self.fallback(&ranked, request.message, FallbackReason::EmptyCompletion)
            }
            Ok(Err(ProviderError::Timeout(after))) => {
                tracing::warn!(module = ?module, timeout = ?after, "Completion timed out, falling back");
                self.fallback(&ranked, request.message, FallbackReason::Timeout)
            }
            Ok(Err(e)) => {
                tracing::warn!(module = ?module, error = %e, "Completion failed, falling back");
                self.fallback(&ranked, request.message, FallbackReason::ProviderError)
            }
            Err(_) => {
                tracing::warn!(module = ?module, timeout = ?timeout, "Completion timed out, falling back");
                self.fallback(&ranked, request.message, FallbackReason::Timeout)
            }
        }
    }

    fn accept(
        &self,
        request: ConversationRequest<'_>,
        ranked: &[GuidanceItem],
        content: String,
    ) -> ConversationalResponse {
        let text = content.trim();
        if text.is_empty() {
            tracing::warn!(module = ?request.module, "Blank completion, falling back");
            return self.fallback(ranked, request.message, FallbackReason::EmptyCompletion);
        }

        if self.strict_grounding {
            let report = check_grounding(text, request.snapshot, ranked);
            if !report.is_grounded() {
                tracing::warn!(
                    module = ?request.module,
                    ungrounded = ?report.ungrounded,
                    "Completion quoted figures not in the case, falling back"
                );
                return self.fallback(ranked, request.message, FallbackReason::Ungrounded);
            }
        }

        ConversationalResponse {
            message: text.to_string(),
            insights: extract_insights(text),
            actions: extract_actions(text),
            confidence: ResponseConfidence::High,
            source: ResponseSource::Service,
            fallback_reason: None,
        }
    }

    fn fallback(&self, ranked: &[GuidanceItem], message: &str, reason: FallbackReason) -> ConversationalResponse {
        fallback_response(&self.composer, ranked, message, reason)
    }
}

impl Default for ConversationalAdapter {
    fn default() -> Self {
        Self::deterministic()
    }
}

impl std::fmt::Debug for ConversationalAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationalAdapter")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("completion", &self.completion)
            .field("strict_grounding", &self.strict_grounding)
            .finish()
    }
}
