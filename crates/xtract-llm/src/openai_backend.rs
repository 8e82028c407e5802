//! OpenAI-compatible chat completions backend
//!
//! Sends a single non-streaming `POST` per invocation and returns
//! `choices[0].message.content` verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use xtract_config::{LlmConfig, PINNED_TEMPERATURE};

use crate::LlmError;
use crate::http_client::{HttpClient, map_transport_error};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

const PROVIDER: &str = "openai";

#[derive(Clone)]
pub struct OpenAiBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: PINNED_TEMPERATURE,
        }
    }
}

impl OpenAiBackend {
    /// Create a new backend
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: String,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url,
            api_key,
            default_model,
            default_params,
        })
    }

    /// Create a backend from the `[llm]` configuration.
    ///
    /// The API key is read from the environment variable named by `api_key_env`.
    /// Defaults come from the extraction profile; callers override model and
    /// `max_tokens` per invocation.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key variable is unset or empty,
    /// or if the HTTP client cannot be constructed.
    pub fn new_from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "API key not found in environment variable '{}'. \
                     Set this variable or configure a different llm.api_key_env.",
                    config.api_key_env
                ))
            })?;

        Self::new(
            api_key,
            config.base_url.clone(),
            config.extract.model.clone(),
            HttpParams {
                max_tokens: config.extract.max_tokens,
                temperature: config.extract.temperature(),
            },
        )
    }

    /// Resolve parameters for this invocation
    ///
    /// `inv.model` overrides the default model; `inv.metadata["max_tokens"]` and
    /// `inv.metadata["temperature"]` override the default parameters.
    fn resolve_params(&self, inv: &LlmInvocation) -> (String, HttpParams) {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let max_tokens = inv
            .metadata
            .get("max_tokens")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(self.default_params.max_tokens);

        let temperature = inv
            .metadata
            .get("temperature")
            .and_then(serde_json::Value::as_f64)
            .map(|v| v as f32)
            .unwrap_or(self.default_params.temperature);

        (
            model,
            HttpParams {
                max_tokens,
                temperature,
            },
        )
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: msg.role.as_str(),
                content: &msg.content,
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = PROVIDER,
            model = %model,
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking chat completions"
        );

        let request_body = ChatRequest {
            model: &model,
            messages: Self::convert_messages(&inv.messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let request = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request_body);

        let response = self.client.execute(request, inv.timeout, PROVIDER).await?;

        let body = response.bytes().await.map_err(|e| {
            map_transport_error(&e, self.client.effective_timeout(inv.timeout), PROVIDER)
        })?;
        let response_body: ChatResponse = serde_json::from_slice(&body).map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse {PROVIDER} response: {e}"))
        })?;

        let choice = response_body.choices.into_iter().next().ok_or_else(|| {
            LlmError::InvalidResponse(format!("{PROVIDER} response missing choices[0]"))
        })?;
        let content = choice.message.content.ok_or_else(|| {
            LlmError::InvalidResponse(format!(
                "{PROVIDER} response missing content in choices[0]"
            ))
        })?;

        let model_used = response_body.model.unwrap_or(model);
        let mut result = LlmResult::new(content, PROVIDER, model_used);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = PROVIDER,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Chat completion received"
        );

        Ok(result)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
