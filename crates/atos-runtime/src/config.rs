//! Runtime configuration from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ATOS_LLM_BACKEND` | `openai` |
//! | `OPENAI_API_KEY` | unset (adapter serves deterministic guidance) |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `OPENAI_MODEL` | `gpt-4o` |
//! | `ATOS_LLM_TIMEOUT` | `30s` |
//! | `ATOS_STRICT_GROUNDING` | `false` |

use std::time::Duration;

use crate::providers::{ApiCredential, CompletionConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::RuntimeError;

pub const BACKEND_ENV: &str = "ATOS_LLM_BACKEND";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const MODEL_ENV: &str = "OPENAI_MODEL";
pub const TIMEOUT_ENV: &str = "ATOS_LLM_TIMEOUT";
pub const STRICT_GROUNDING_ENV: &str = "ATOS_STRICT_GROUNDING";

pub const DEFAULT_BACKEND: &str = "openai";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Settings for the conversational adapter.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Registry name of the chat backend
    pub backend: String,

    /// Absent key is a supported state, not an error
    pub api_key: Option<ApiCredential>,

    pub base_url: String,

    pub model: String,

    pub timeout: Duration,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Fall back when generated text quotes unknown dollar figures
    pub strict_grounding: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            strict_grounding: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RuntimeError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = ApiCredential::from_lookup(&lookup, API_KEY_ENV, "OpenAI API key").ok();

        let base_url = match get(BASE_URL_ENV) {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                url.trim_end_matches('/').to_string()
            }
            Some(url) => {
                return Err(RuntimeError::Config(format!(
                    "{} must start with http:// or https://, got '{}'",
                    BASE_URL_ENV, url
                )))
            }
            None => DEFAULT_BASE_URL.to_string(),
        };

        let timeout = match get(TIMEOUT_ENV) {
            Some(raw) => humantime::parse_duration(&raw)
                .map_err(|e| RuntimeError::Config(format!("{}='{}': {}", TIMEOUT_ENV, raw, e)))?,
            None => DEFAULT_TIMEOUT,
        };

        let strict_grounding = match get(STRICT_GROUNDING_ENV) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                RuntimeError::Config(format!("{}='{}' is not a boolean", STRICT_GROUNDING_ENV, raw))
            })?,
            None => false,
        };

        Ok(Self {
            backend: get(BACKEND_ENV).unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            api_key,
            base_url,
            model: get(MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout,
            strict_grounding,
            ..Self::default()
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert!(!config.has_credential());
        assert_eq!(config.backend, "openai");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.strict_grounding);
    }

    #[test]
    fn test_reads_all_values() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("ATOS_LLM_BACKEND", "local"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1/"),
            ("OPENAI_MODEL", "llama3"),
            ("ATOS_LLM_TIMEOUT", "2m 30s"),
            ("ATOS_STRICT_GROUNDING", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_ref().map(|k| k.expose()), Some("sk-test"));
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.backend, "local");
        assert_eq!(config.timeout, Duration::from_secs(150));
        assert!(config.strict_grounding);
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config = RuntimeConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(!config.has_credential());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            RuntimeConfig::from_lookup(lookup(&[("ATOS_LLM_TIMEOUT", "soon")])),
            Err(RuntimeError::Config(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_lookup(lookup(&[("ATOS_STRICT_GROUNDING", "maybe")])),
            Err(RuntimeError::Config(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_lookup(lookup(&[("OPENAI_BASE_URL", "api.openai.com")])),
            Err(RuntimeError::Config(_))
        ));
    }

    #[test]
    fn test_completion_config_carries_settings() {
        let config = RuntimeConfig::from_lookup(lookup(&[("ATOS_LLM_TIMEOUT", "5s")])).unwrap();
        let completion = config.completion_config();
        assert_eq!(completion.timeout, Duration::from_secs(5));
        assert_eq!(completion.max_tokens, 2000);
        assert!((completion.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let config = RuntimeConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-hidden-123")])).unwrap();
        assert!(!format!("{:?}", config).contains("sk-hidden-123"));
    }
}
