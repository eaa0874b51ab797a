//! Result types for extraction

use sift_domain::ExtractedRecord;
use std::fmt;
use std::time::Duration;

use crate::error::ExtractorError;

/// Records extracted from one segment
///
/// An empty `records` list is a valid "nothing found" answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// Index of the segment the records came from
    pub segment_index: usize,

    /// Records in the order the model returned them
    pub records: Vec<ExtractedRecord>,
}

/// A segment that could not be extracted
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFailure {
    /// Index of the failing segment
    pub segment_index: usize,

    /// Number of calls made before giving up
    pub attempts: u32,

    /// The last error seen
    pub error: ExtractorError,
}

/// Per-segment result of a dispatch
pub type SegmentOutcome = Result<ExtractionResult, SegmentFailure>;

/// One merged record and the segment it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    /// Originating segment
    pub segment_index: usize,

    /// The record
    pub record: ExtractedRecord,
}

/// Ordered collection of merged records
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    entries: Vec<ResultEntry>,
}

impl ResultSet {
    /// Create an empty result set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn push(&mut self, segment_index: usize, record: ExtractedRecord) {
        self.entries.push(ResultEntry {
            segment_index,
            record,
        });
    }

    /// Entries in segment order
    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    /// Iterate over the records alone
    pub fn records(&self) -> impl Iterator<Item = &ExtractedRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Consume the set, keeping only the records
    pub fn into_records(self) -> Vec<ExtractedRecord> {
        self.entries.into_iter().map(|e| e.record).collect()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no records were found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters from one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DispatchStats {
    /// Segments that produced a result
    pub succeeded: usize,

    /// Segments that failed after all attempts
    pub failed: usize,

    /// Extra calls made by retries
    pub retries: usize,

    /// Wall-clock time of the dispatch
    pub elapsed: Duration,
}

/// Outcomes of a dispatch, in segment order
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One outcome per input segment, in input order
    pub outcomes: Vec<SegmentOutcome>,

    /// Dispatch counters
    pub stats: DispatchStats,
}

/// Overall status of an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// Every segment succeeded and at least one record was found
    Complete,
    /// Every segment succeeded but nothing was found
    NoRecords,
    /// Some segments failed
    Partial,
    /// Every processed segment failed
    Failed,
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExtractionStatus::Complete => "complete",
            ExtractionStatus::NoRecords => "no records",
            ExtractionStatus::Partial => "partial",
            ExtractionStatus::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Metadata about an extraction operation
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMetadata {
    /// Source identifier
    pub source_id: String,

    /// Name of the model used
    pub model_name: String,

    /// Segment selection strategy
    pub strategy: String,

    /// Unix timestamp (seconds) when extraction started
    pub timestamp: u64,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Final output of the pipeline
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// Merged records
    pub records: ResultSet,

    /// Segments that failed
    pub failures: Vec<SegmentFailure>,

    /// Segments sent to the model
    pub segments_processed: usize,

    /// Segments produced by the chunker
    pub segments_total: usize,

    /// Records dropped by deduplication
    pub duplicates_removed: usize,

    /// Dispatch counters
    pub stats: DispatchStats,

    /// Metadata about the run
    pub metadata: ExtractionMetadata,
}

impl ExtractionReport {
    /// Distinguish "nothing found" from "extraction failed"
    pub fn status(&self) -> ExtractionStatus {
        if self.failures.is_empty() {
            if self.records.is_empty() {
                ExtractionStatus::NoRecords
            } else {
                ExtractionStatus::Complete
            }
        } else if self.failures.len() < self.segments_processed {
            ExtractionStatus::Partial
        } else {
            ExtractionStatus::Failed
        }
    }
}
