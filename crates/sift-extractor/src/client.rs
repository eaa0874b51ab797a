//! Extractor client: one segment in, typed records out

use sift_domain::traits::LlmProvider;
use sift_domain::Segment;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::prompt::PromptBuilder;
use crate::schema::ExtractionSchema;
use crate::types::ExtractionResult;

/// Anything that can turn one segment into an `ExtractionResult`
///
/// The dispatcher is generic over this trait so tests can substitute
/// doubles that count concurrency or fail on demand.
pub trait SegmentExtractor: Send + Sync {
    /// Extract records from one segment with a single model call
    fn extract(
        &self,
        segment: &Segment,
    ) -> impl Future<Output = Result<ExtractionResult, ExtractorError>> + Send;

    /// Name of the model doing the extraction
    fn model_name(&self) -> &str;
}

/// Sends segments to a structured-output model and parses the typed result
///
/// Each call renders the prompt, issues exactly one provider request with
/// the schema attached and applies the per-call timeout. No state is kept
/// between calls and nothing is retried here.
pub struct ExtractorClient<L: LlmProvider> {
    provider: L,
    schema: Arc<ExtractionSchema>,
    json_schema: String,
    timeout: Duration,
}

impl<L: LlmProvider> ExtractorClient<L> {
    /// Create a client for `schema`, validating the schema first
    pub fn new(provider: L, schema: ExtractionSchema, timeout: Duration) -> Result<Self, ExtractorError> {
        schema.validate()?;
        let json_schema = serde_json::to_string(&schema.json_schema())
            .map_err(|e| ExtractorError::InvalidConfiguration(format!("Unrenderable schema: {}", e)))?;

        Ok(Self {
            provider,
            schema: Arc::new(schema),
            json_schema,
            timeout,
        })
    }

    /// The schema records are extracted against
    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    /// The per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<L> SegmentExtractor for ExtractorClient<L>
where
    L: LlmProvider + Send + Sync,
    ExtractorError: From<L::Error>,
{
    async fn extract(&self, segment: &Segment) -> Result<ExtractionResult, ExtractorError> {
        let prompt = PromptBuilder::new(&self.schema, &segment.text).build();
        debug!("Segment {}: prompt length {} chars", segment.index, prompt.len());

        let response = timeout(
            self.timeout,
            self.provider.generate_structured(&prompt, &self.json_schema),
        )
        .await
        .map_err(|_| ExtractorError::Timeout(self.timeout))??;

        debug!("Segment {}: response length {} chars", segment.index, response.len());

        let records = parse_response(&response, &self.schema)?;
        Ok(ExtractionResult {
            segment_index: segment.index,
            records,
        })
    }

    fn model_name(&self) -> &str {
        self.provider.model_name()
    }
}
