//! Segment module - bounded slices of a document

use std::ops::Range;

/// A bounded-length slice of a document's text
///
/// Segments are produced in order by the chunker. `byte_range` locates the
/// text inside the source document; `unit_range` locates it in the
/// chunker's counting units (words or graphemes), which is where the
/// overlap between neighbours is measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position of this segment in chunk order (0-based)
    pub index: usize,

    /// The segment text, an exact substring of the document
    pub text: String,

    /// Byte offsets of `text` inside the document
    pub byte_range: Range<usize>,

    /// Unit offsets of `text` inside the document
    pub unit_range: Range<usize>,
}

impl Segment {
    /// Create a new segment
    pub fn new(index: usize, text: String, byte_range: Range<usize>, unit_range: Range<usize>) -> Self {
        Self {
            index,
            text,
            byte_range,
            unit_range,
        }
    }

    /// Number of counting units in this segment
    pub fn unit_len(&self) -> usize {
        self.unit_range.len()
    }

    /// Number of units shared with the following segment
    pub fn units_shared_with(&self, next: &Segment) -> usize {
        self.unit_range.end.saturating_sub(next.unit_range.start)
    }
}
