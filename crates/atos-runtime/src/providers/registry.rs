//! Backends by name.
//!
//! `RuntimeConfig::backend` names the service to talk to; the registry maps
//! that name to a builder. Adding a service means registering one function.
//!
//! ```ignore
//! let mut registry = ProviderRegistry::with_defaults();
//! registry.register("local", build_local_provider);
//! let provider = registry.build(&RuntimeConfig::from_env()?)?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{LlmProvider, ProviderError};
use crate::config::RuntimeConfig;

/// Builds a provider from runtime settings.
///
/// Returns [`ProviderError::NotConfigured`] when the settings lack something
/// the backend needs, such as a credential.
pub type BackendBuilder = fn(&RuntimeConfig) -> Result<Arc<dyn LlmProvider>, ProviderError>;

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    backends: BTreeMap<&'static str, BackendBuilder>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the backends compiled into this build.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "openai")]
        registry.register(super::openai::BACKEND, super::openai::build);
        registry
    }

    /// Add a backend. A later registration under the same name replaces it.
    pub fn register(&mut self, name: &'static str, builder: BackendBuilder) -> &mut Self {
        self.backends.insert(name, builder);
        self
    }

    /// Build the backend `config.backend` names.
    pub fn build(&self, config: &RuntimeConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let builder = self.backends.get(config.backend.as_str()).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown backend '{}' (registered: {})",
                config.backend,
                self.names().join(", ")
            ))
        })?;
        builder(config)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.keys().copied().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.backends.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, Completion, CompletionConfig};
    use async_trait::async_trait;

    /// Repeats the last user turn.
    struct Parrot;

    #[async_trait]
    impl LlmProvider for Parrot {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            config: &CompletionConfig,
        ) -> Result<Completion, ProviderError> {
            Ok(Completion {
                text: messages.last().map(|m| m.content.clone()).unwrap_or_default(),
                model: config.model.clone(),
                tokens: None,
            })
        }

        fn name(&self) -> &str {
            "parrot"
        }
    }

    fn parrot(_: &RuntimeConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(Parrot))
    }

    fn needs_key(config: &RuntimeConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        match config.api_key {
            Some(_) => Ok(Arc::new(Parrot)),
            None => Err(ProviderError::NotConfigured("key required".to_string())),
        }
    }

    fn config_for(backend: &str) -> RuntimeConfig {
        RuntimeConfig {
            backend: backend.to_string(),
            ..RuntimeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_build_registered_backend() {
        let mut registry = ProviderRegistry::new();
        registry.register("parrot", parrot);
        assert!(registry.contains("parrot"));

        let config = config_for("parrot");
        let provider = registry.build(&config).unwrap();
        let reply = provider
            .complete(&[ChatMessage::user("Which lines are contested?")], &config.completion_config())
            .await
            .unwrap();
        assert_eq!(reply.text, "Which lines are contested?");
    }

    #[test]
    fn test_unknown_backend_lists_registered_names() {
        let mut registry = ProviderRegistry::new();
        registry.register("parrot", parrot);
        match registry.build(&config_for("mainframe")) {
            Err(ProviderError::NotConfigured(msg)) => {
                assert!(msg.contains("mainframe"));
                assert!(msg.contains("parrot"));
            }
            other => panic!("expected NotConfigured, got {:?}", other.map(|p| p.name().to_string())),
        }
    }

    #[test]
    fn test_builder_sees_missing_credential() {
        let mut registry = ProviderRegistry::new();
        registry.register("keyed", needs_key);
        assert!(registry.build(&config_for("keyed")).is_err());
    }

    #[test]
    fn test_later_registration_wins() {
        let mut registry = ProviderRegistry::new();
        registry.register("svc", needs_key).register("svc", parrot);
        assert_eq!(registry.names(), vec!["svc"]);
        assert!(registry.build(&config_for("svc")).is_ok());
        assert_eq!(format!("{:?}", registry), r#"["svc"]"#);
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_defaults_register_openai() {
        assert_eq!(ProviderRegistry::with_defaults().names(), vec!["openai"]);
    }
}
