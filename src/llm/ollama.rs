use super::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Ollama provider implementation
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given base URL and model
    pub fn new(base_url: String, model: String) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
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

impl OllamaGenerateRequest {
    fn build(model: &str, request: GenerateRequest) -> Self {
        let options = (request.max_tokens.is_some() || request.temperature.is_some()).then(|| {
            OllamaOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
            }
        });

        Self {
            model: model.to_string(),
            prompt: request.prompt,
            stream: false,
            system: request.system,
            format: (request.format == ResponseFormat::Json).then_some("json"),
            options,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let start = Instant::now();
        let timeout = request.timeout;
        let ollama_request = OllamaGenerateRequest::build(&self.model, request);

        let url = format!("{}/api/generate", self.base_url);

        // Execute with timeout
        let response =
            tokio::time::timeout(timeout, self.client.post(&url).json(&ollama_request).send())
                .await
                .map_err(|_| LlmError::Timeout(timeout))?
                .map_err(|e| LlmError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::ApiError(format!(
                "Ollama API returned status: {}",
                response.status()
            )));
        }

        let ollama_response: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let latency_ms = start.elapsed().as_millis() as u64;

        Ok(GenerateResponse {
            text: ollama_response.response.trim().to_string(),
            metadata: ResponseMetadata {
                provider: "ollama".to_string(),
                model: self.model.clone(),
                tokens_used: ollama_response.eval_count,
                latency_ms,
            },
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: ResponseFormat) -> GenerateRequest {
        GenerateRequest {
            system: Some("Judge fairly.".to_string()),
            prompt: "Score this.".to_string(),
            max_tokens: Some(100),
            temperature: None,
            format,
            timeout: LlmConfig::default().default_timeout,
        }
    }

    #[test]
    fn test_json_format_is_forwarded() {
        let body = OllamaGenerateRequest::build("llama3.2", request(ResponseFormat::Json));
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["format"], "json");
        assert_eq!(value["system"], "Judge fairly.");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["num_predict"], 100);
        assert!(value["options"].get("temperature").is_none());
    }

    #[test]
    fn test_text_format_omits_format_field() {
        let body = OllamaGenerateRequest::build("llama3.2", request(ResponseFormat::Text));
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("format").is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let provider =
            OllamaProvider::new("http://localhost:11434/".to_string(), "llama3.2".to_string())
                .unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    #[ignore] // Only run with Ollama running locally
    async fn test_ollama_generate() {
        let provider =
            OllamaProvider::new("http://localhost:11434".to_string(), "llama3.2".to_string())
                .unwrap();

        let response = provider.generate(request(ResponseFormat::Text)).await.unwrap();

        assert!(!response.text.is_empty());
        assert_eq!(response.metadata.provider, "ollama");
        println!("Generated text: {}", response.text);
    }
}
