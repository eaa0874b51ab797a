//! Sift Extractor
//!
//! Extracts schema-conforming records from long text with a
//! structured-output language model.
//!
//! # Overview
//!
//! Long text does not fit in one model call, so it is split into
//! overlapping segments, each segment is extracted independently under a
//! concurrency cap, and the per-segment results are merged back in order.
//! An alternative path first selects the segments most similar to a query.
//!
//! # Architecture
//!
//! ```text
//! Text → Chunker → [RetrievalSelector] → BatchDispatcher → ExtractorClient → LLM
//!                                                ↓
//!                               ResultMerger → ExtractionReport
//! ```
//!
//! # Key Features
//!
//! - **Chunking**: word or grapheme units, configurable size and overlap
//! - **Structured output**: schemas rendered to JSON Schema, strict parsing
//! - **Bounded concurrency**: fixed worker pool, ordered results, retries
//! - **Failure isolation**: per-segment outcomes or abort on first error
//! - **Deduplication**: optional, keyed on the evidence field
//!
//! # Example Usage
//!
//! ```
//! use sift_domain::Document;
//! use sift_extractor::{
//!     BruteForce, ExtractionPipeline, ExtractionSchema, ExtractionStatus, ExtractorClient,
//!     ExtractorConfig,
//! };
//! use sift_llm::MockProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::default();
//! let client = ExtractorClient::new(
//!     MockProvider::default(),
//!     ExtractionSchema::key_developments(),
//!     config.request_timeout(),
//! )?;
//! let pipeline = ExtractionPipeline::with_client(client, &config)?;
//!
//! let document = Document::new("Nothing of historic interest happened here.");
//! let report = pipeline.run(&document, &BruteForce).await?;
//!
//! assert_eq!(report.status(), ExtractionStatus::NoRecords);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod client;
mod config;
mod dispatcher;
mod error;
mod merger;
mod parser;
mod pipeline;
mod prompt;
mod retrieval;
mod schema;
mod types;


pub use chunking::{count_units, Chunker, Segments};
pub use client::{ExtractorClient, SegmentExtractor};
pub use config::{ChunkConfig, ChunkUnit, ExtractorConfig, FailurePolicy, RetrievalConfig};
pub use dispatcher::{BatchDispatcher, DispatchConfig};
pub use error::ExtractorError;
pub use merger::{MergeOutput, ResultMerger};
pub use parser::parse_response;
pub use pipeline::{BruteForce, ExtractionPipeline, RetrievalStrategy, SegmentStrategy};
pub use prompt::PromptBuilder;
pub use retrieval::{RetrievalSelector, ScoredSegment};
pub use schema::{ExtractionSchema, FieldKind, FieldSpec};
pub use types::{
    BatchOutcome, DispatchStats, ExtractionMetadata, ExtractionReport, ExtractionResult,
    ExtractionStatus, ResultEntry, ResultSet, SegmentFailure, SegmentOutcome,
};
