//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API, using the `format`
//! field of `/api/generate` to constrain output to a JSON Schema.
//!
//! # Examples
//!
//! ```no_run
//! use sift_llm::OllamaProvider;
//! use sift_domain::traits::LlmProvider;
//!
//! # async fn example() -> Result<(), sift_llm::LlmError> {
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1")?;
//! let output = provider
//!     .generate_structured("Extract...", r#"{"type": "object"}"#)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::{error_for_status, LlmError};
use serde::{Deserialize, Serialize};
use sift_domain::traits::LlmProvider;
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default transport timeout for LLM requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    system_prompt: Option<String>,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    format: serde_json::Value,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.1", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new Ollama provider with an explicit transport timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            system_prompt: None,
        })
    }

    /// Create a new Ollama provider against `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set a system prompt sent with every request
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    async fn send(&self, prompt: &str, json_schema: &str) -> Result<String, LlmError> {
        let format: serde_json::Value = serde_json::from_str(json_schema)
            .map_err(|e| LlmError::Other(format!("Invalid JSON schema: {}", e)))?;

        let url = format!("{}/api/generate", self.endpoint);
        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            system: self.system_prompt.as_deref(),
            stream: false,
            format,
            options: OllamaOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(error_for_status(status, &error_text, &self.model));
        }

        response
            .json::<OllamaGenerateResponse>()
            .await
            .map(|body| body.response)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

impl LlmProvider for OllamaProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate_structured(&self, prompt: &str, json_schema: &str) -> Result<String, LlmError> {
        self.send(prompt, json_schema).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3.1").unwrap();
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model_name(), "llama3.1");
        assert!(provider.system_prompt.is_none());
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral")
            .unwrap()
            .with_system_prompt("be precise");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.system_prompt.as_deref(), Some("be precise"));
    }

    #[test]
    fn test_request_serialization() {
        let body = OllamaGenerateRequest {
            model: "llama3.1",
            prompt: "p",
            system: None,
            stream: false,
            format: serde_json::json!({"type": "object"}),
            options: OllamaOptions { temperature: 0.0 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["format"]["type"], "object");
        assert_eq!(json["stream"], false);
        assert!(json.get("system").is_none());
    }

    #[tokio::test]
    async fn test_invalid_schema_is_rejected_before_sending() {
        let provider = OllamaProvider::default_endpoint("llama3.1").unwrap();
        let result = provider.generate_structured("p", "not json").await;
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[tokio::test]
    async fn test_ollama_error_handling() {
        // Invalid port triggers a transport error without network access
        let provider = OllamaProvider::new("http://localhost:99999", "llama3.1").unwrap();

        let result = provider.generate_structured("test", "{}").await;
        match result {
            Err(LlmError::Communication(_)) => {}
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore] // Only run when Ollama is available
    async fn test_ollama_generate_integration() {
        let provider = OllamaProvider::default_endpoint("llama3.1").unwrap();
        let schema = r#"{"type":"object","properties":{"records":{"type":"array"}},"required":["records"]}"#;
        let result = provider.generate_structured("Return no records.", schema).await;
        if let Ok(response) = result {
            assert!(response.contains("records"));
        }
    }
}
