//! End-to-end extraction: chunk, select, dispatch, merge

use sift_domain::{Document, Segment};
use sift_domain::traits::LlmProvider;
use sift_store::embedding::EmbeddingModel;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::chunking::Chunker;
use crate::client::{ExtractorClient, SegmentExtractor};
use crate::config::ExtractorConfig;
use crate::dispatcher::{BatchDispatcher, DispatchConfig};
use crate::error::ExtractorError;
use crate::merger::ResultMerger;
use crate::retrieval::RetrievalSelector;
use crate::types::{ExtractionMetadata, ExtractionReport};

/// Chooses which segments are sent to the model
pub trait SegmentStrategy: Send + Sync {
    /// Short name recorded in extraction metadata
    fn name(&self) -> &str;

    /// Pick the segments to extract, keeping their original indexes
    ///
    /// The selection may come back in any order; the pipeline restores
    /// segment order before dispatch.
    fn select(&self, segments: Vec<Segment>) -> Result<Vec<Segment>, ExtractorError>;
}

/// Extract from every segment
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl SegmentStrategy for BruteForce {
    fn name(&self) -> &str {
        "brute_force"
    }

    fn select(&self, segments: Vec<Segment>) -> Result<Vec<Segment>, ExtractorError> {
        Ok(segments)
    }
}

/// Extract only from the segments most similar to a query
#[derive(Debug, Clone)]
pub struct RetrievalStrategy<M> {
    selector: RetrievalSelector<M>,
    query: String,
}

impl<M> RetrievalStrategy<M> {
    /// Create a strategy ranking segments against `query`
    pub fn new(selector: RetrievalSelector<M>, query: impl Into<String>) -> Self {
        Self {
            selector,
            query: query.into(),
        }
    }
}

impl<M> SegmentStrategy for RetrievalStrategy<M>
where
    M: EmbeddingModel + Clone + Send + Sync,
{
    fn name(&self) -> &str {
        "retrieval"
    }

    fn select(&self, segments: Vec<Segment>) -> Result<Vec<Segment>, ExtractorError> {
        let scored = self.selector.select(&segments, &self.query)?;
        Ok(scored.into_iter().map(|s| s.segment).collect())
    }
}

/// Runs a document through chunking, segment selection, the batch
/// dispatcher and the merger
pub struct ExtractionPipeline<E> {
    extractor: Arc<E>,
    chunker: Chunker,
    dispatcher: BatchDispatcher,
    merger: ResultMerger,
    max_text_length: usize,
}

impl<E: SegmentExtractor + 'static> ExtractionPipeline<E> {
    /// Build a pipeline; `evidence_field` is used for deduplication
    pub fn new(extractor: E, evidence_field: &str, config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate()?;
        Ok(Self {
            extractor: Arc::new(extractor),
            chunker: Chunker::from_config(&config.chunk)?,
            dispatcher: BatchDispatcher::new(DispatchConfig::from_config(config))?,
            merger: ResultMerger::new(evidence_field).with_deduplication(config.deduplicate),
            max_text_length: config.max_text_length,
        })
    }

    /// The chunker in use
    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Extract records from `document`
    pub async fn run(
        &self,
        document: &Document,
        strategy: &dyn SegmentStrategy,
    ) -> Result<ExtractionReport, ExtractorError> {
        let started = Instant::now();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if document.len() > self.max_text_length {
            return Err(ExtractorError::TextTooLong(document.len(), self.max_text_length));
        }

        let source_id = document.source_label();
        info!(
            "Starting extraction for '{}' ({} bytes, strategy {})",
            source_id,
            document.len(),
            strategy.name()
        );

        let segments = self.chunker.chunk(document.content());
        let segments_total = segments.len();
        let mut selected = strategy.select(segments)?;
        selected.sort_by_key(|segment| segment.index);
        let segments_processed = selected.len();
        info!("Selected {} of {} segments", segments_processed, segments_total);

        let batch = self
            .dispatcher
            .dispatch(Arc::clone(&self.extractor), selected)
            .await?;
        let merged = self.merger.merge(batch.outcomes);

        let report = ExtractionReport {
            records: merged.records,
            failures: merged.failures,
            segments_processed,
            segments_total,
            duplicates_removed: merged.duplicates_removed,
            stats: batch.stats,
            metadata: ExtractionMetadata {
                source_id,
                model_name: self.extractor.model_name().to_string(),
                strategy: strategy.name().to_string(),
                timestamp,
                processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            },
        };

        info!(
            "Extraction {}: {} records, {} failed segments",
            report.status(),
            report.records.len(),
            report.failures.len()
        );

        Ok(report)
    }
}

impl<L> ExtractionPipeline<ExtractorClient<L>>
where
    L: LlmProvider + Send + Sync + 'static,
    ExtractorError: From<L::Error>,
{
    /// Build a pipeline around a client, deduplicating on its schema's
    /// evidence field
    pub fn with_client(client: ExtractorClient<L>, config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        let evidence_field = client.schema().evidence_field.clone();
        Self::new(client, &evidence_field, config)
    }
}
