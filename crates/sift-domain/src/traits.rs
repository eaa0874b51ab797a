//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use std::future::Future;

/// Trait for structured-output language model providers
///
/// Implemented by the infrastructure layer (sift-llm). One call to
/// `generate_structured` is one outbound request; implementations keep no
/// per-call state and do not retry.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Name of the model behind this provider, used in extraction metadata
    fn model_name(&self) -> &str;

    /// Generate output constrained to `json_schema`
    ///
    /// `json_schema` is a serialized JSON Schema document. The returned
    /// string is the raw model output; parsing and conformance checks are the
    /// caller's concern.
    fn generate_structured(
        &self,
        prompt: &str,
        json_schema: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
