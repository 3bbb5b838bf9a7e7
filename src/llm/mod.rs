//! LLM provider abstraction used by the chunk summarizer.
//!
//! Providers are reached over plain HTTP with `reqwest`. Each client reports up front whether
//! it will honor a response schema ([`OutputMode::Schema`]) or only return free text
//! ([`OutputMode::Plain`]); the mode is fixed when the client is built and never probed at
//! call time.

mod ollama;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, LlmProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Errors surfaced by LLM providers.
#[derive(Debug, Error)]
pub enum LlmClientError {
    /// Provider could not be reached or the client could not be built.
    #[error("LLM provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider rejected the request because of rate limiting.
    #[error("LLM provider rate limited the request: {0}")]
    RateLimited(String),
    /// Request did not complete within the configured timeout.
    #[error("LLM request timed out: {0}")]
    Timeout(String),
    /// Provider returned an error response.
    #[error("Failed to generate content: {0}")]
    GenerationFailed(String),
    /// Provider response could not be decoded.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// How a client returns content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Free text only; response schemas are ignored.
    Plain,
    /// JSON constrained by the response schema attached to the request.
    Schema,
}

impl OutputMode {
    /// Select the mode from the `LLM_STRUCTURED_OUTPUT` flag.
    pub fn from_flag(structured: bool) -> Self {
        if structured { Self::Schema } else { Self::Plain }
    }
}

/// Prompt pair and decoding options sent to a provider.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Instructions placed in the provider's system slot.
    pub system_prompt: String,
    /// User turn content.
    pub user_prompt: String,
    /// JSON schema for the reply; only honored by [`OutputMode::Schema`] clients.
    pub response_schema: Option<Value>,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Raw provider reply.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Reply text (a JSON document when a schema was honored).
    pub text: String,
    /// Model that produced the reply.
    pub model: String,
}

/// Interface implemented by LLM providers.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider label reported in health payloads.
    fn provider_name(&self) -> &str {
        "custom"
    }

    /// Model identifier requests are sent to.
    fn model_name(&self) -> &str;

    /// Output capability fixed at construction.
    fn output_mode(&self) -> OutputMode;

    /// Generate content for a single system/user prompt pair.
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, LlmClientError>;
}

/// Build the LLM client selected by configuration.
pub fn get_llm_client(config: &Config) -> Result<Arc<dyn LlmClient>, LlmClientError> {
    let mode = OutputMode::from_flag(config.llm_structured_output);
    let timeout = Duration::from_secs(config.llm_timeout_secs.max(1));
    tracing::info!(
        provider = config.llm_provider.label(),
        model = %config.llm_model,
        ?mode,
        "Initializing LLM client"
    );
    match config.llm_provider {
        LlmProvider::Ollama => Ok(Arc::new(OllamaClient::new(
            config.ollama_url.clone(),
            config.llm_model.clone(),
            mode,
            timeout,
        )?)),
        LlmProvider::OpenAI => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                LlmClientError::ProviderUnavailable("OPENAI_API_KEY is not set".into())
            })?;
            Ok(Arc::new(OpenAiClient::new(
                config.openai_base_url.clone(),
                api_key,
                config.llm_model.clone(),
                mode,
                timeout,
            )?))
        }
    }
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client, LlmClientError> {
    reqwest::Client::builder()
        .user_agent(concat!("pdfdigest/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|error| {
            LlmClientError::ProviderUnavailable(format!("failed to build HTTP client: {error}"))
        })
}

fn map_send_error(provider: &str, endpoint: &str, error: reqwest::Error) -> LlmClientError {
    if error.is_timeout() {
        LlmClientError::Timeout(format!("{provider} request to {endpoint} timed out"))
    } else {
        LlmClientError::ProviderUnavailable(format!(
            "failed to reach {provider} at {endpoint}: {error}"
        ))
    }
}

fn map_error_status(provider: &str, status: StatusCode, body: String) -> LlmClientError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            LlmClientError::RateLimited(format!("{provider} returned {status}: {body}"))
        }
        StatusCode::NOT_FOUND => {
            LlmClientError::ProviderUnavailable(format!("{provider} returned {status}: {body}"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            LlmClientError::Timeout(format!("{provider} returned {status}"))
        }
        _ => LlmClientError::GenerationFailed(format!("{provider} returned {status}: {body}")),
    }
}
