//! OpenAI-compatible chat completions provider.
//!
//! Uses `response_format: {"type": "json_schema", ..., "strict": true}` so the
//! service only returns values that conform to the supplied schema.

use crate::{error_for_status, LlmError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use sift_domain::traits::LlmProvider;
use std::time::Duration;

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// System prompt used when none is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert at extracting structured information from text. \
Only extract information that is present in the text. \
Return an empty collection if nothing relevant can be found.";

/// Async client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    system_prompt: String,
}

impl OpenAiProvider {
    /// Builds a new client.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Other("missing OpenAI API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(LlmError::Other("missing OpenAI model name".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| LlmError::Other("invalid OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Other(format!("failed to build OpenAI HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        })
    }

    /// Replace the system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    async fn send(&self, prompt: &str, json_schema: &str) -> Result<String, LlmError> {
        let schema: serde_json::Value = serde_json::from_str(json_schema)
            .map_err(|e| LlmError::Other(format!("Invalid JSON schema: {}", e)))?;
        let name = schema_name(&schema);

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &self.system_prompt },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat { name, schema, strict: true },
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(error_for_status(status, &body, &self.model));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse completion: {}", e)))?;
        first_content(parsed)
    }
}

impl LlmProvider for OpenAiProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate_structured(&self, prompt: &str, json_schema: &str) -> Result<String, LlmError> {
        self.send(prompt, json_schema).await
    }
}

/// Schema names must match `^[a-zA-Z0-9_-]+$`
fn schema_name(schema: &serde_json::Value) -> String {
    let raw = schema
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or("extraction");
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "extraction".to_string()
    } else {
        cleaned
    }
}

fn first_content(response: ChatResponse) -> Result<String, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("completion has no choices".to_string()))?;

    if let Some(refusal) = choice.message.refusal {
        return Err(LlmError::InvalidResponse(format!("model refused: {}", refusal)));
    }
    choice
        .message
        .content
        .ok_or_else(|| LlmError::InvalidResponse("completion has no content".to_string()))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: serde_json::Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}
