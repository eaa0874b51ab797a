//! Combine per-segment outcomes into one ordered result set

use std::collections::HashSet;
use tracing::debug;

use crate::types::{ResultSet, SegmentFailure, SegmentOutcome};

/// Merged records plus the segments that failed
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutput {
    /// Records in segment order
    pub records: ResultSet,

    /// Failed segments in segment order
    pub failures: Vec<SegmentFailure>,

    /// Records dropped as duplicates
    pub duplicates_removed: usize,
}

/// Concatenates successful results in segment order
///
/// With deduplication on, a record whose evidence matches an earlier
/// record's evidence (after whitespace normalisation) is dropped. Records
/// without an evidence value are always kept.
#[derive(Debug, Clone)]
pub struct ResultMerger {
    evidence_field: String,
    deduplicate: bool,
}

impl ResultMerger {
    /// Create a merger that reads evidence from `evidence_field`
    pub fn new(evidence_field: impl Into<String>) -> Self {
        Self {
            evidence_field: evidence_field.into(),
            deduplicate: false,
        }
    }

    /// Enable or disable evidence-based deduplication
    pub fn with_deduplication(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    /// Merge outcomes, which must already be in segment order
    pub fn merge(&self, outcomes: Vec<SegmentOutcome>) -> MergeOutput {
        let mut records = ResultSet::new();
        let mut failures = Vec::new();
        let mut seen = HashSet::new();
        let mut duplicates_removed = 0;

        for outcome in outcomes {
            let result = match outcome {
                Ok(result) => result,
                Err(failure) => {
                    failures.push(failure);
                    continue;
                }
            };

            for record in result.records {
                if self.deduplicate {
                    let key = record.text(&self.evidence_field).map(normalize_whitespace);
                    if let Some(key) = key.filter(|k| !k.is_empty()) {
                        if !seen.insert(key) {
                            duplicates_removed += 1;
                            continue;
                        }
                    }
                }
                records.push(result.segment_index, record);
            }
        }

        debug!(
            "Merged {} records ({} duplicates removed, {} failed segments)",
            records.len(),
            duplicates_removed,
            failures.len()
        );

        MergeOutput {
            records,
            failures,
            duplicates_removed,
        }
    }
}

/// Trim and collapse internal whitespace runs to single spaces
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
