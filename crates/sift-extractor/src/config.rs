//! Configuration for the extraction pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ExtractorError;

/// Counting unit used by the chunker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkUnit {
    /// One unit per word, trailing whitespace and punctuation included
    #[default]
    Words,
    /// One unit per extended grapheme cluster
    Graphemes,
}

/// What the dispatcher does when a segment fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and keep going
    #[default]
    Continue,
    /// Cancel remaining work and return the first failure
    AbortOnFirstError,
}

/// Segment size and overlap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Maximum segment size in units
    pub max_units: usize,

    /// Units shared by consecutive segments
    pub overlap: usize,

    /// Counting unit
    pub unit: ChunkUnit,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_units: 2000,
            overlap: 20,
            unit: ChunkUnit::Words,
        }
    }
}

/// Settings for the relevance-filtered path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of segments to keep
    pub top_k: usize,

    /// Dimension of the hashed embedding model
    pub embedding_dimension: usize,

    /// HNSW candidate list size at query time
    pub ef_search: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 1,
            embedding_dimension: 384,
            ef_search: 64,
        }
    }
}

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum input text length (bytes)
    pub max_text_length: usize,

    /// Chunking parameters
    pub chunk: ChunkConfig,

    /// Maximum model calls in flight
    pub max_concurrency: usize,

    /// Maximum time for a single model call (seconds)
    pub request_timeout_secs: u64,

    /// Extra attempts for retryable failures
    pub max_retries: u32,

    /// Base delay between retries (milliseconds), doubled per attempt
    pub retry_backoff_ms: u64,

    /// Also retry malformed model output
    pub retry_invalid_format: bool,

    /// Behaviour when a segment fails
    pub failure_policy: FailurePolicy,

    /// Drop records whose evidence repeats an earlier record's
    pub deduplicate: bool,

    /// Retrieval path settings
    pub retrieval: RetrievalConfig,
}

impl ExtractorConfig {
    /// Get the per-call timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the base retry delay as a Duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        let invalid = |msg: &str| Err(ExtractorError::InvalidConfiguration(msg.to_string()));

        if self.max_text_length == 0 {
            return invalid("max_text_length must be greater than 0");
        }
        if self.chunk.max_units == 0 {
            return invalid("chunk.max_units must be greater than 0");
        }
        if self.chunk.overlap >= self.chunk.max_units {
            return invalid("chunk.overlap must be smaller than chunk.max_units");
        }
        if self.max_concurrency == 0 {
            return invalid("max_concurrency must be greater than 0");
        }
        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be greater than 0");
        }
        if self.retrieval.top_k == 0 {
            return invalid("retrieval.top_k must be greater than 0");
        }
        if self.retrieval.embedding_dimension == 0 {
            return invalid("retrieval.embedding_dimension must be greater than 0");
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 5_000_000,
            chunk: ChunkConfig::default(),
            max_concurrency: 5,
            request_timeout_secs: 120,
            max_retries: 2,
            retry_backoff_ms: 500,
            retry_invalid_format: false,
            failure_policy: FailurePolicy::Continue,
            deduplicate: false,
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: smaller segments, more parallelism, fail fast
    pub fn aggressive() -> Self {
        Self {
            chunk: ChunkConfig {
                max_units: 1000,
                overlap: 20,
                unit: ChunkUnit::Words,
            },
            max_concurrency: 16,
            request_timeout_secs: 60,
            max_retries: 0,
            failure_policy: FailurePolicy::AbortOnFirstError,
            ..Self::default()
        }
    }

    /// Lenient preset: larger segments, patient retries, deduplicated output
    pub fn lenient() -> Self {
        Self {
            chunk: ChunkConfig {
                max_units: 4000,
                overlap: 100,
                unit: ChunkUnit::Words,
            },
            max_concurrency: 2,
            request_timeout_secs: 300,
            max_retries: 4,
            retry_backoff_ms: 1_000,
            retry_invalid_format: true,
            deduplicate: true,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExtractorError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ExtractorError::Config(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
