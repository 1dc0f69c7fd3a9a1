//! API key handling.
//!
//! A key is wrapped in [`SecretString`] the moment it is read. `Debug` and
//! `Display` print `[REDACTED]`; the raw value is read only where the
//! authorization header is set.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::ProviderError;

/// Where a key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Programmatic,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Environment => "environment",
            CredentialSource::Programmatic => "programmatic",
        }
    }
}

pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    /// Human label, e.g. "OpenAI API key"
    label: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, label: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            label,
        }
    }

    /// Read `var` from the process environment.
    pub fn from_env(var: &str, label: &'static str) -> Result<Self, ProviderError> {
        Self::from_lookup(|key| std::env::var(key).ok(), var, label)
    }

    /// Read `var` through `lookup`. Unset and blank are both "not configured".
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        var: &str,
        label: &'static str,
    ) -> Result<Self, ProviderError> {
        match lookup(var) {
            Some(value) if !value.trim().is_empty() => {
                Ok(Self::new(value.trim(), CredentialSource::Environment, label))
            }
            _ => Err(ProviderError::NotConfigured(format!("{} is not set", var))),
        }
    }

    /// The raw key. Only the HTTP layer should call this.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl Clone for ApiCredential {
    fn clone(&self) -> Self {
        Self::new(self.expose(), self.source, self.label)
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiCredential({}, {}, [REDACTED])", self.label, self.source.as_str())
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [REDACTED]", self.label)
    }
}
