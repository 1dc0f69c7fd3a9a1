//! OpenAI-compatible chat-completion provider.
//!
//! Works against any service exposing `POST {base_url}/chat/completions`
//! with bearer authentication.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::{ApiCredential, ChatMessage, Completion, CompletionConfig, LlmProvider, ProviderError};
use crate::config::{RuntimeConfig, API_KEY_ENV};

/// Registry name.
pub(crate) const BACKEND: &str = "openai";

pub struct OpenAiCompatibleProvider {
    credential: ApiCredential,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiCompatibleProvider {
    pub fn new(credential: ApiCredential, base_url: &str) -> Self {
        Self {
            credential,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Registry builder: needs a key and an http(s) base URL.
pub(crate) fn build(config: &RuntimeConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    let credential = config
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured(format!("{} is not set", API_KEY_ENV)))?;
    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        return Err(ProviderError::NotConfigured(format!(
            "base URL '{}' is not http(s)",
            config.base_url
        )));
    }
    Ok(Arc::new(OpenAiCompatibleProvider::new(credential, &config.base_url)))
}

#[derive(Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn parse_completion(body: &str, requested_model: &str) -> Result<Completion, ProviderError> {
    let body: ResponseBody =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let text = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(ProviderError::EmptyCompletion)?;

    Ok(Completion {
        text,
        model: body.model.unwrap_or_else(|| requested_model.to_string()),
        tokens: body.usage.map(|u| u.total_tokens),
    })
}

/// Readable message from an error body, or the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Transport(e.to_string())
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: &CompletionConfig,
    ) -> Result<Completion, ProviderError> {
        let body = RequestBody {
            model: &config.model,
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.credential.expose())
            .timeout(config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, config.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, config.timeout))?;

        match status.as_u16() {
            401 | 403 => Err(ProviderError::Unauthorized),
            _ if status.is_success() => parse_completion(&text, &config.model),
            code => Err(ProviderError::Status {
                status: code,
                message: error_message(&text),
            }),
        }
    }

    fn name(&self) -> &str {
        BACKEND
    }
}
