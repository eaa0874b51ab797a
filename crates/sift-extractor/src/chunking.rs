//! Splitting long text into bounded, overlapping segments
//!
//! Text is measured in units (words or grapheme clusters). Unit spans tile
//! the text with no gaps, so every byte belongs to exactly one unit and the
//! segments built from consecutive unit runs cover the whole input.

use sift_domain::Segment;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::{ChunkConfig, ChunkUnit};
use crate::error::ExtractorError;

/// Splits text into segments of at most `max_units` units, consecutive
/// segments sharing `overlap` units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunker {
    max_units: usize,
    overlap: usize,
    unit: ChunkUnit,
}

impl Chunker {
    /// Create a new chunker
    ///
    /// Fails if `max_units` is zero or `overlap` is not smaller than it.
    pub fn new(max_units: usize, overlap: usize, unit: ChunkUnit) -> Result<Self, ExtractorError> {
        if max_units == 0 {
            return Err(ExtractorError::InvalidConfiguration(
                "segment size must be greater than 0".to_string(),
            ));
        }
        if overlap >= max_units {
            return Err(ExtractorError::InvalidConfiguration(format!(
                "overlap ({}) must be smaller than segment size ({})",
                overlap, max_units
            )));
        }
        Ok(Self {
            max_units,
            overlap,
            unit,
        })
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkConfig) -> Result<Self, ExtractorError> {
        Self::new(config.max_units, config.overlap, config.unit)
    }

    /// Units between the starts of consecutive segments
    pub fn stride(&self) -> usize {
        self.max_units - self.overlap
    }

    /// Lazily split `text` into segments, in order
    pub fn segments<'a>(&self, text: &'a str) -> Segments<'a> {
        Segments {
            text,
            starts: unit_starts(text, self.unit),
            next_unit: 0,
            next_index: 0,
            max_units: self.max_units,
            stride: self.stride(),
            finished: text.is_empty(),
        }
    }

    /// Split `text` into segments, collected
    pub fn chunk(&self, text: &str) -> Vec<Segment> {
        self.segments(text).collect()
    }
}

/// Iterator over the segments of one text
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    starts: Vec<usize>,
    next_unit: usize,
    next_index: usize,
    max_units: usize,
    stride: usize,
    finished: bool,
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.finished {
            return None;
        }

        let total = self.starts.len();
        let start_unit = self.next_unit;
        let end_unit = (start_unit + self.max_units).min(total);

        let byte_start = self.starts[start_unit];
        let byte_end = if end_unit == total {
            self.text.len()
        } else {
            self.starts[end_unit]
        };

        let segment = Segment::new(
            self.next_index,
            self.text[byte_start..byte_end].to_string(),
            byte_start..byte_end,
            start_unit..end_unit,
        );

        self.next_index += 1;
        if end_unit == total {
            self.finished = true;
        } else {
            self.next_unit += self.stride;
        }

        Some(segment)
    }
}

impl std::iter::FusedIterator for Segments<'_> {}

/// Number of units in `text`
pub fn count_units(text: &str, unit: ChunkUnit) -> usize {
    unit_starts(text, unit).len()
}

/// Byte offset where each unit begins; the first unit always begins at 0
fn unit_starts(text: &str, unit: ChunkUnit) -> Vec<usize> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut starts = match unit {
        ChunkUnit::Graphemes => text.grapheme_indices(true).map(|(i, _)| i).collect(),
        ChunkUnit::Words => text
            .split_word_bound_indices()
            .filter(|(_, piece)| piece.chars().any(char::is_alphanumeric))
            .map(|(i, _)| i)
            .collect::<Vec<_>>(),
    };

    // Leading whitespace and punctuation belong to the first unit
    match starts.first_mut() {
        Some(first) => *first = 0,
        None => starts.push(0),
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{} ", i)).collect()
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(matches!(
            Chunker::new(10, 10, ChunkUnit::Words),
            Err(ExtractorError::InvalidConfiguration(_))
        ));
        assert!(Chunker::new(10, 11, ChunkUnit::Words).is_err());
        assert!(Chunker::new(0, 0, ChunkUnit::Words).is_err());
        assert!(Chunker::new(10, 9, ChunkUnit::Words).is_ok());
    }

    #[test]
    fn test_empty_text_has_no_segments() {
        let chunker = Chunker::new(5, 1, ChunkUnit::Words).unwrap();
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn test_short_text_is_single_segment() {
        let chunker = Chunker::new(100, 10, ChunkUnit::Words).unwrap();
        let text = "Single line of text without paragraphs.";
        let segments = chunker.chunk(text);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, text);
        assert_eq!(segments[0].byte_range, 0..text.len());
    }

    #[test]
    fn test_ten_thousand_words_gives_six_segments() {
        let text = words(10_000);
        let chunker = Chunker::new(2000, 20, ChunkUnit::Words).unwrap();
        let segments = chunker.chunk(&text);

        assert_eq!(segments.len(), 6);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].units_shared_with(&pair[1]), 20);
        }
        assert_eq!(segments[5].unit_range, 9900..10_000);
        assert!(segments[0].text.starts_with("w0 "));
        assert!(segments[5].text.ends_with("w9999 "));
    }

    #[test]
    fn test_word_units_keep_punctuation_with_word() {
        let text = "  Hello, world. Again!";
        assert_eq!(count_units(text, ChunkUnit::Words), 3);

        let chunker = Chunker::new(1, 0, ChunkUnit::Words).unwrap();
        let texts: Vec<String> = chunker.chunk(text).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["  Hello, ", "world. ", "Again!"]);
    }

    #[test]
    fn test_whitespace_only_is_one_unit() {
        assert_eq!(count_units("   \n\t ", ChunkUnit::Words), 1);
        let chunker = Chunker::new(3, 1, ChunkUnit::Words).unwrap();
        assert_eq!(chunker.chunk("   ").len(), 1);
    }

    #[test]
    fn test_grapheme_units() {
        let text = "ae\u{301}🇫🇷x";
        assert_eq!(count_units(text, ChunkUnit::Graphemes), 4);

        let chunker = Chunker::new(2, 1, ChunkUnit::Graphemes).unwrap();
        let texts: Vec<String> = chunker.chunk(text).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["ae\u{301}", "e\u{301}🇫🇷", "🇫🇷x"]);
    }

    #[test]
    fn test_segments_is_lazy_and_indexed() {
        let text = words(50);
        let chunker = Chunker::new(10, 2, ChunkUnit::Words).unwrap();
        let mut iter = chunker.segments(&text);

        let first = iter.next().unwrap();
        assert_eq!(first.index, 0);
        let second = iter.next().unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.unit_range.start, 8);
    }

    proptest! {
        #[test]
        fn prop_segments_cover_text(
            text in "[a-z ,.\n]{0,400}",
            size in 1usize..40,
            overlap_seed in 0usize..40,
            graphemes in any::<bool>(),
        ) {
            let overlap = overlap_seed % size;
            let unit = if graphemes { ChunkUnit::Graphemes } else { ChunkUnit::Words };
            let chunker = Chunker::new(size, overlap, unit).unwrap();
            let segments = chunker.chunk(&text);

            if text.is_empty() {
                prop_assert!(segments.is_empty());
            } else {
                prop_assert_eq!(segments[0].byte_range.start, 0);
                prop_assert_eq!(segments.last().unwrap().byte_range.end, text.len());
                prop_assert_eq!(segments.last().unwrap().unit_range.end, count_units(&text, unit));
            }

            for (i, segment) in segments.iter().enumerate() {
                prop_assert_eq!(segment.index, i);
                prop_assert!(segment.unit_len() <= size);
                prop_assert_eq!(&text[segment.byte_range.clone()], segment.text.as_str());
            }

            for pair in segments.windows(2) {
                prop_assert!(pair[1].byte_range.start <= pair[0].byte_range.end);
                prop_assert_eq!(pair[1].unit_range.start - pair[0].unit_range.start, size - overlap);
                prop_assert_eq!(pair[0].units_shared_with(&pair[1]), overlap);
            }
        }
    }
}
