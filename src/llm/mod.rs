mod ollama;
mod openai;

use async_trait::async_trait;
use std::time::Duration;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),

    #[error("All providers failed")]
    Exhausted,
}

/// Request to generate a short line of text
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Instructions sent ahead of the prompt (system role where supported)
    pub system_prompt: Option<String>,
    pub prompt: String,
    /// Maximum response length in tokens (provider-dependent)
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// The generated text
    pub text: String,
    pub metadata: ResponseMetadata,
}

/// Metadata about the LLM response
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// Name of the provider (e.g., "openai", "ollama")
    pub provider: String,
    pub model: String,
    /// Tokens consumed (if available)
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

/// Trait that all LLM providers must implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Manager for multiple LLM providers
pub struct LlmManager {
    pub providers: Vec<Box<dyn LlmProvider>>,
}

impl LlmManager {
    /// Create a new LLM manager with the given providers
    pub fn new(providers: Vec<Box<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Try each provider in configuration order and return the first
    /// non-empty answer
    pub async fn generate_first(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        for provider in &self.providers {
            match provider.generate(request.clone()).await {
                Ok(response) if !response.text.trim().is_empty() => {
                    tracing::debug!(
                        "LLM response from {} ({}) in {}ms, tokens: {:?}",
                        provider.name(),
                        response.metadata.model,
                        response.metadata.latency_ms,
                        response.metadata.tokens_used
                    );
                    return Ok(response);
                }
                Ok(_) => {
                    tracing::warn!("Provider {} returned an empty response", provider.name());
                }
                Err(e) => {
                    tracing::warn!("Provider {} failed: {}", provider.name(), e);
                }
            }
        }
        Err(LlmError::Exhausted)
    }
}

/// Configuration for LLM providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Unset disables the Ollama provider
    pub ollama_base_url: Option<String>,
    pub ollama_model: String,
    /// Timeout for a single bot statement request
    pub default_timeout: Duration,
    pub default_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: None,
            ollama_model: "llama3.2".to_string(),
            default_timeout: Duration::from_secs(5),
            default_max_tokens: 60,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
            openai_model: non_empty_env("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            ollama_base_url: non_empty_env("OLLAMA_BASE_URL"),
            ollama_model: non_empty_env("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            default_timeout: non_empty_env("LLM_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            default_max_tokens: non_empty_env("LLM_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_max_tokens),
        }
    }

    /// Build an LlmManager with all configured providers
    pub fn build_manager(&self) -> LlmResult<LlmManager> {
        let mut providers: Vec<Box<dyn LlmProvider>> = Vec::new();

        if let Some(api_key) = &self.openai_api_key {
            providers.push(Box::new(OpenAiProvider::new(
                api_key.clone(),
                self.openai_model.clone(),
            )));
        }

        if let Some(base_url) = &self.ollama_base_url {
            providers.push(Box::new(OllamaProvider::new(
                base_url.clone(),
                self.ollama_model.clone(),
            )));
        }

        if providers.is_empty() {
            return Err(LlmError::ConfigError(
                "No LLM providers configured. Set OPENAI_API_KEY or OLLAMA_BASE_URL".to_string(),
            ));
        }

        Ok(LlmManager::new(providers))
    }
}
