use crate::processing::{ChunkingError, chunking::validate_chunking};
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration shared by the MCP, HTTP, and CLI entrypoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// LLM backend used for chunk summarization.
    pub llm_provider: LlmProvider,
    /// Model identifier passed to the provider.
    pub llm_model: String,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// API key for the OpenAI-compatible provider.
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible provider.
    pub openai_base_url: String,
    /// Whether to request schema-constrained JSON from the provider.
    pub llm_structured_output: bool,
    /// Per-request timeout for LLM calls, in seconds.
    pub llm_timeout_secs: u64,
    /// Words shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunk size applied when the detected language has no explicit mapping.
    pub default_chunk_size: usize,
    /// Timeout for downloading remote PDFs, in seconds.
    pub pdf_fetch_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported LLM backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI (or compatible) chat completions API.
    OpenAI,
}

impl LlmProvider {
    /// Lowercase label used in logs and health payloads.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let llm_provider: LlmProvider = load_env("LLM_PROVIDER")?
            .parse()
            .map_err(|()| ConfigError::InvalidValue("LLM_PROVIDER".to_string()))?;
        let openai_api_key = load_env_optional("OPENAI_API_KEY");
        if llm_provider == LlmProvider::OpenAI && openai_api_key.is_none() {
            return Err(ConfigError::MissingVariable("OPENAI_API_KEY".to_string()));
        }

        let chunk_overlap = parse_optional("CHUNK_OVERLAP")?.unwrap_or(50);
        let default_chunk_size = parse_optional("DEFAULT_CHUNK_SIZE")?.unwrap_or(600);
        check_chunk_settings(chunk_overlap, default_chunk_size)?;

        Ok(Self {
            llm_provider,
            llm_model: load_env("LLM_MODEL")?,
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            openai_api_key,
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            llm_structured_output: load_env_optional("LLM_STRUCTURED_OUTPUT")
                .map(|value| parse_bool("LLM_STRUCTURED_OUTPUT", &value))
                .transpose()?
                .unwrap_or(true),
            llm_timeout_secs: parse_optional("LLM_TIMEOUT_SECS")?.unwrap_or(120),
            chunk_overlap,
            default_chunk_size,
            pdf_fetch_timeout_secs: parse_optional("PDF_FETCH_TIMEOUT_SECS")?.unwrap_or(10),
            server_port: parse_optional("SERVER_PORT")?,
        })
    }
}

fn check_chunk_settings(overlap: usize, default_chunk_size: usize) -> Result<(), ConfigError> {
    validate_chunking(overlap, default_chunk_size).map_err(|error| {
        let key = match error {
            ChunkingError::InvalidChunkSize => "DEFAULT_CHUNK_SIZE",
            ChunkingError::OverlapTooLarge { .. } => "CHUNK_OVERLAP",
        };
        ConfigError::InvalidValue(key.to_string())
    })
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        provider = config.llm_provider.label(),
        model = %config.llm_model,
        structured_output = config.llm_structured_output,
        chunk_overlap = config.chunk_overlap,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
