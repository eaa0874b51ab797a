//! Retrieval selector: keep only the segments most similar to a query
//!
//! This path is lossy. It suits questions answered by a few passages and
//! misses information spread across the whole text; brute-force extraction
//! over every segment is the safer default.

use sift_domain::Segment;
use sift_store::embedding::EmbeddingModel;
use sift_store::TextIndex;
use tracing::{debug, warn};

use crate::error::ExtractorError;

/// A segment selected by similarity, with its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSegment {
    /// The selected segment
    pub segment: Segment,

    /// Cosine similarity to the query; higher is closer
    pub score: f32,
}

/// Indexes segments by embedding and returns the top-k for a query
#[derive(Debug, Clone)]
pub struct RetrievalSelector<M> {
    model: M,
    top_k: usize,
    ef_search: usize,
}

impl<M: EmbeddingModel + Clone> RetrievalSelector<M> {
    /// Create a selector returning up to `top_k` segments
    pub fn new(model: M, top_k: usize, ef_search: usize) -> Result<Self, ExtractorError> {
        if top_k == 0 {
            return Err(ExtractorError::InvalidConfiguration(
                "top_k must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            model,
            top_k,
            ef_search,
        })
    }

    /// Number of segments returned per query
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rank `segments` against `query`, most similar first
    ///
    /// Returns at most `top_k` segments; fewer when there are fewer
    /// segments. Segments that cannot be embedded are skipped.
    pub fn select(&self, segments: &[Segment], query: &str) -> Result<Vec<ScoredSegment>, ExtractorError> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        let mut index = TextIndex::new(self.model.clone(), segments.len());
        for (position, segment) in segments.iter().enumerate() {
            if let Err(e) = index.add(position, &segment.text) {
                warn!("Skipping segment {} for retrieval: {}", segment.index, e);
            }
        }
        debug!("Indexed {} of {} segments", index.len(), segments.len());

        let hits = index.search(query, self.top_k, self.ef_search)?;
        let selected: Vec<ScoredSegment> = hits
            .into_iter()
            .filter_map(|(position, score)| {
                segments.get(position).map(|segment| ScoredSegment {
                    segment: segment.clone(),
                    score,
                })
            })
            .collect();

        debug!(
            "Selected segments {:?} for query '{}'",
            selected.iter().map(|s| s.segment.index).collect::<Vec<_>>(),
            query
        );
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_store::embedding::HashedEmbeddingModel;

    fn segments(texts: &[&str]) -> Vec<Segment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Segment::new(i, t.to_string(), 0..t.len(), i..i + 1))
            .collect()
    }

    fn selector(top_k: usize) -> RetrievalSelector<HashedEmbeddingModel> {
        RetrievalSelector::new(HashedEmbeddingModel::new(2048), top_k, 64).unwrap()
    }

    #[test]
    fn test_zero_k_rejected() {
        let result = RetrievalSelector::new(HashedEmbeddingModel::new(64), 0, 64);
        assert!(matches!(result, Err(ExtractorError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_closest_segment_first() {
        let segments = segments(&[
            "Bread is baked from flour and water.",
            "Karl Benz built the first car with a combustion engine in 1886.",
            "Glaciers move slowly downhill.",
        ]);

        let selected = selector(1).select(&segments, "car engine history").unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].segment.index, 1);
    }

    #[test]
    fn test_k_larger_than_segments_returns_all() {
        let segments = segments(&["cars and engines", "bread and flour"]);
        let selected = selector(5).select(&segments, "cars").unwrap();

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].segment.index, 0);
        assert!(selected[0].score >= selected[1].score);
    }

    #[test]
    fn test_unembeddable_segments_skipped() {
        let segments = segments(&["   ", "cars and engines"]);
        let selected = selector(5).select(&segments, "cars").unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].segment.index, 1);
    }

    #[test]
    fn test_empty_segments() {
        assert!(selector(1).select(&[], "cars").unwrap().is_empty());
    }

    #[test]
    fn test_empty_query_is_retrieval_error() {
        let segments = segments(&["cars"]);
        assert!(matches!(
            selector(1).select(&segments, "  "),
            Err(ExtractorError::Retrieval(_))
        ));
    }
}
