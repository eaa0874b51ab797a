//! Sift LLM Provider Layer
//!
//! Pluggable structured-output LLM providers.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from `sift-domain`.
//! Every provider sends exactly one request per call and leaves retry policy to
//! the caller.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `OllamaProvider`: Local Ollama API with JSON-schema constrained output
//! - `OpenAiProvider`: OpenAI-compatible chat completions with strict `json_schema` output
//!
//! # Examples
//!
//! ```
//! use sift_llm::MockProvider;
//! use sift_domain::traits::LlmProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new(r#"{"records": []}"#);
//! let result = provider.generate_structured("prompt", "{}").await.unwrap();
//! assert_eq!(result, r#"{"records": []}"#);
//! # }
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;

use sift_domain::traits::LlmProvider;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether a fresh attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Communication(_) | LlmError::RateLimitExceeded)
    }
}

/// Map a non-success HTTP status to an `LlmError`
pub(crate) fn error_for_status(status: reqwest::StatusCode, body: &str, model: &str) -> LlmError {
    if status == reqwest::StatusCode::NOT_FOUND {
        LlmError::ModelNotAvailable(model.to_string())
    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimitExceeded
    } else {
        LlmError::Communication(format!("HTTP {}: {}", status, body))
    }
}

/// Scripted reply for the mock provider
#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(LlmError),
}

#[derive(Debug, Clone)]
struct MockRule {
    needle: String,
    reply: MockReply,
    delay: Option<Duration>,
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Rules match when the prompt *contains* the configured needle; the first
/// matching rule wins, otherwise the default response is returned.
///
/// The provider also records how many calls were made and the largest
/// number of calls that were in flight at the same time, which makes it a
/// convenient double for concurrency tests.
///
/// # Examples
///
/// ```
/// use sift_llm::MockProvider;
/// use sift_domain::traits::LlmProvider;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut provider = MockProvider::default();
/// provider.add_response("Benz", r#"{"records": [{"year": 1886}]}"#);
/// provider.add_error("broken");
///
/// assert!(provider.generate_structured("Karl Benz...", "{}").await.unwrap().contains("1886"));
/// assert!(provider.generate_structured("a broken segment", "{}").await.is_err());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model_name: String,
    default_response: String,
    rules: Arc<Mutex<Vec<MockRule>>>,
    call_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model_name: "mock".to_string(),
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the reported model name
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Respond with `response` whenever the prompt contains `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.push_rule(needle.into(), MockReply::Text(response.into()), None);
    }

    /// Respond with `response` after `delay` whenever the prompt contains `needle`
    pub fn add_delayed_response(
        &mut self,
        needle: impl Into<String>,
        response: impl Into<String>,
        delay: Duration,
    ) {
        self.push_rule(needle.into(), MockReply::Text(response.into()), Some(delay));
    }

    /// Fail with a communication error whenever the prompt contains `needle`
    pub fn add_error(&mut self, needle: impl Into<String>) {
        self.add_failure(needle, LlmError::Communication("Mock error".to_string()));
    }

    /// Fail with `error` whenever the prompt contains `needle`
    pub fn add_failure(&mut self, needle: impl Into<String>, error: LlmError) {
        self.push_rule(needle.into(), MockReply::Error(error), None);
    }

    fn push_rule(&mut self, needle: String, reply: MockReply, delay: Option<Duration>) {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(MockRule { needle, reply, delay });
        }
    }

    /// Get the number of times the provider was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Largest number of simultaneously outstanding calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Reset the call counters
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    fn lookup(&self, prompt: &str) -> (MockReply, Option<Duration>) {
        let rules = match self.rules.lock() {
            Ok(rules) => rules,
            Err(poisoned) => poisoned.into_inner(),
        };
        rules
            .iter()
            .find(|rule| prompt.contains(&rule.needle))
            .map(|rule| (rule.reply.clone(), rule.delay))
            .unwrap_or_else(|| (MockReply::Text(self.default_response.clone()), None))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"records": []}"#)
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate_structured(&self, prompt: &str, _json_schema: &str) -> Result<String, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let (reply, delay) = self.lookup(prompt);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate_structured("any prompt", "{}").await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::new("fallback");
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate_structured("say hello", "{}").await.unwrap(), "world");
        assert_eq!(provider.generate_structured("foo!", "{}").await.unwrap(), "bar");
        assert_eq!(provider.generate_structured("unknown", "{}").await.unwrap(), "fallback");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate_structured("prompt1", "{}").await.unwrap();
        provider.generate_structured("prompt2", "{}").await.unwrap();
        assert_eq!(provider.call_count(), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.generate_structured("a bad prompt", "{}").await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_scripted_failure() {
        let mut provider = MockProvider::default();
        provider.add_failure("llama", LlmError::ModelNotAvailable("llama3.1".to_string()));

        let result = provider.generate_structured("ask llama", "{}").await;
        assert_eq!(result, Err(LlmError::ModelNotAvailable("llama3.1".to_string())));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_counters() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate_structured("test", "{}").await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_tracks_in_flight_calls() {
        let mut provider = MockProvider::new("x");
        provider.add_delayed_response("slow", "done", Duration::from_millis(30));

        let (a, b) = tokio::join!(
            provider.generate_structured("slow 1", "{}"),
            provider.generate_structured("slow 2", "{}"),
        );
        assert_eq!(a.unwrap(), "done");
        assert_eq!(b.unwrap(), "done");
        assert_eq!(provider.max_in_flight(), 2);
    }

    #[test]
    fn test_model_name() {
        let provider = MockProvider::default().with_model_name("test-model");
        assert_eq!(provider.model_name(), "test-model");
    }

    #[test]
    fn test_error_for_status() {
        assert_eq!(
            error_for_status(reqwest::StatusCode::NOT_FOUND, "", "llama3"),
            LlmError::ModelNotAvailable("llama3".to_string())
        );
        assert_eq!(
            error_for_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "", "m"),
            LlmError::RateLimitExceeded
        );
        assert!(matches!(
            error_for_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom", "m"),
            LlmError::Communication(msg) if msg.contains("boom")
        ));
    }

    #[test]
    fn test_transient_errors() {
        assert!(LlmError::RateLimitExceeded.is_transient());
        assert!(LlmError::Communication("x".into()).is_transient());
        assert!(!LlmError::InvalidResponse("x".into()).is_transient());
        assert!(!LlmError::ModelNotAvailable("x".into()).is_transient());
    }
}
