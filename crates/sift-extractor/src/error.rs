//! Error types for the Extractor

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// Chunking, schema or dispatcher parameters are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// The model service failed to answer (transport or provider error)
    #[error("Service error: {0}")]
    Service(String),

    /// The model service refused the request and retrying cannot help
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// A model call did not finish in time
    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    /// Malformed or schema non-conforming model output
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Embedding or similarity index failure on the retrieval path
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// A segment failed while the dispatcher was set to abort on first error
    #[error("Extraction aborted at segment {segment_index}: {source}")]
    Aggregate {
        /// Index of the first segment that failed
        segment_index: usize,
        /// The underlying failure
        source: Box<ExtractorError>,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractorError::Service(_) | ExtractorError::Timeout(_))
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidFormat(format!("JSON parse error: {}", e))
    }
}

impl From<sift_llm::LlmError> for ExtractorError {
    fn from(e: sift_llm::LlmError) -> Self {
        match e {
            sift_llm::LlmError::InvalidResponse(msg) => ExtractorError::InvalidFormat(msg),
            other if other.is_transient() => ExtractorError::Service(other.to_string()),
            other => ExtractorError::Rejected(other.to_string()),
        }
    }
}

impl From<sift_store::StoreError> for ExtractorError {
    fn from(e: sift_store::StoreError) -> Self {
        ExtractorError::Retrieval(e.to_string())
    }
}
