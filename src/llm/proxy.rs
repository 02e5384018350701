//! Chat-completions proxy client.
//!
//! The website never holds model credentials; requests go to a proxy that
//! forwards them to the hosted model. The wire shape is the OpenAI-style
//! `/chat/completions` body and response.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::{IntakeConfig, PROXY_URL_VAR};
use crate::error::LlmError;

use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};

const PROVIDER: &str = "proxy";

/// Completion provider backed by an HTTP proxy endpoint.
pub struct ProxyProvider {
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<SecretString>,
    model: String,
}

impl ProxyProvider {
    /// Create a provider from configuration.
    ///
    /// A missing endpoint is not an error here: the provider is still built and
    /// every call fails fast with [`LlmError::NotConfigured`].
    pub fn new(config: &IntakeConfig) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            status: None,
            reason: format!("Failed to build HTTP client: {e}"),
        })?;

        if config.proxy_url.is_none() {
            tracing::warn!(
                "{} is not set; the assistant will answer with canned replies only",
                PROXY_URL_VAR
            );
        }

        Ok(Self {
            client,
            endpoint: config.proxy_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

#[async_trait]
impl LlmProvider for ProxyProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| LlmError::NotConfigured {
            var: PROXY_URL_VAR.to_string(),
        })?;

        let body = WireRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut http = self.client.post(endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            http = http.bearer_auth(key.expose_secret());
        }

        let response = http.send().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            status: None,
            reason: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            status: Some(status.as_u16()),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                status: Some(status.as_u16()),
                reason: format!("HTTP {status}: {}", truncate(&text, 200)),
            });
        }

        parse_completion(&text)
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Parse a chat-completions response body.
///
/// A body that is not JSON, or JSON without a `choices` array shape, is an
/// [`LlmError::InvalidResponse`]. A well-formed body whose first choice has no
/// text yields `content: None`.
pub fn parse_completion(body: &str) -> Result<CompletionResponse, LlmError> {
    let parsed: WireResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;

    let Some(first) = parsed.choices.into_iter().next() else {
        return Ok(CompletionResponse::empty());
    };

    Ok(CompletionResponse {
        content: first.message.and_then(|m| m.content),
        finish_reason: FinishReason::from_wire(first.finish_reason.as_deref()),
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
