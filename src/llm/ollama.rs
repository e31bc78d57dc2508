use super::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Ollama provider implementation
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given base URL and model
    pub fn new(base_url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client for Ollama: {}", e);
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let start = Instant::now();

        let options = (request.max_tokens.is_some() || request.temperature.is_some()).then(|| {
            OllamaOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
            }
        });
        let ollama_request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: request.prompt,
            system: request.system_prompt,
            stream: false,
            options,
        };

        let url = format!("{}/api/generate", self.base_url);

        // The deadline covers the body read as well as the headers
        let ollama_response = tokio::time::timeout(request.timeout, async {
            let response = self
                .client
                .post(&url)
                .json(&ollama_request)
                .send()
                .await
                .map_err(|e| LlmError::ApiError(e.to_string()))?;

            if !response.status().is_success() {
                return Err(LlmError::ApiError(format!(
                    "Ollama API returned status: {}",
                    response.status()
                )));
            }

            response
                .json::<OllamaGenerateResponse>()
                .await
                .map_err(|e| LlmError::ParseError(e.to_string()))
        })
        .await
        .map_err(|_| LlmError::Timeout(request.timeout))??;

        Ok(GenerateResponse {
            text: ollama_response.response.trim().to_string(),
            metadata: ResponseMetadata {
                provider: "ollama".to_string(),
                model: self.model.clone(),
                tokens_used: ollama_response.eval_count,
                latency_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
