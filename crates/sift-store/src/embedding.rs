//! Embedding Models for Text Vectorization
//!
//! This module provides text-to-vector conversion for retrieval filtering.
//! Real embedding services are external collaborators; the pipeline only
//! depends on the `EmbeddingModel` trait.
//!
//! # Models
//!
//! - **HashedEmbeddingModel**: Feature-hashed bag of words. Deterministic,
//!   dependency-free, and similar texts (shared vocabulary) land close
//!   together, which is enough for lexical relevance filtering and tests.
//!
//! # Examples
//!
//! ```rust
//! use sift_store::embedding::{HashedEmbeddingModel, EmbeddingModel, cosine_similarity};
//!
//! let model = HashedEmbeddingModel::new(1024);
//! let cars = model.embed("The first cars were built in 1886").unwrap();
//! let query = model.embed("first cars").unwrap();
//! let bread = model.embed("Sourdough needs a starter").unwrap();
//! assert!(cosine_similarity(&cars, &query) > cosine_similarity(&bread, &query));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during embedding generation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Trait for embedding models
pub trait EmbeddingModel {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Feature-hashing embedding model
///
/// Each lowercased alphanumeric term is hashed into one of `dimension`
/// buckets with a hash-derived sign; the counts are then normalized to unit
/// length for cosine similarity. Embeddings are:
///
/// - **Deterministic**: Same text always produces same embedding
/// - **Normalized**: All vectors have unit length
/// - **Lexical**: Texts sharing terms have positive similarity
#[derive(Debug, Clone)]
pub struct HashedEmbeddingModel {
    dimension: usize,
}

impl HashedEmbeddingModel {
    /// Create a new hashed embedding model
    ///
    /// # Parameters
    ///
    /// - `dimension`: The embedding dimension (e.g., 384)
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Hash a term with a seed to get a deterministic u64
    fn hash_with_seed(term: &str, seed: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        term.hash(&mut hasher);
        seed.hash(&mut hasher);
        hasher.finish()
    }

    fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}

impl EmbeddingModel for HashedEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InferenceFailed(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for term in Self::terms(text) {
            let bucket = (Self::hash_with_seed(&term, 0) % self.dimension as u64) as usize;
            let sign = if Self::hash_with_seed(&term, 1) & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude == 0.0 {
            return Err(EmbeddingError::InvalidInput(
                "Text contains no embeddable terms".to_string(),
            ));
        }
        for value in &mut embedding {
            *value /= magnitude;
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in [-1, 1]; 0.0 if either vector has zero magnitude.
///
/// # Panics
///
/// Panics if vectors have different lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have same length");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_deterministic() {
        let model = HashedEmbeddingModel::new(384);

        let text = "The quick brown fox jumps over the lazy dog";
        assert_eq!(model.embed(text).unwrap(), model.embed(text).unwrap());
    }

    #[test]
    fn test_embedding_dimension() {
        let model = HashedEmbeddingModel::new(128);
        assert_eq!(model.embed("test").unwrap().len(), 128);
        assert_eq!(model.dimension(), 128);
    }

    #[test]
    fn test_embedding_normalized() {
        let model = HashedEmbeddingModel::new(384);
        let embedding = model.embed("test text with several words").unwrap();

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001, "Embedding should be normalized");
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let model = HashedEmbeddingModel::new(256);
        let a = model.embed("Cars, cars!").unwrap();
        let b = model.embed("cars cars").unwrap();
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_shared_terms_increase_similarity() {
        let model = HashedEmbeddingModel::new(384);
        let query = model.embed("electric cars").unwrap();
        let related = model.embed("Electric cars became popular again").unwrap();
        let unrelated = model.embed("Bread rises because of yeast").unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_rejected() {
        let model = HashedEmbeddingModel::new(384);

        let result = model.embed("   ");
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
        assert!(model.embed("--- !!!").is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let model = HashedEmbeddingModel::new(0);
        assert!(matches!(model.embed("text"), Err(EmbeddingError::InferenceFailed(_))));
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let vec = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&vec, &vec) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(similarity.abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
