//! Sift Similarity Layer
//!
//! Embedding models and an HNSW vector index, combined into a `TextIndex`
//! that answers "given these texts and a query, which k are most similar?".
//!
//! # Architecture
//!
//! - `embedding`: `EmbeddingModel` trait and a deterministic hashed model
//! - `vector_index`: HNSW nearest-neighbor index keyed by `usize`
//! - `TextIndex`: embeds texts on insert and queries on search
//!
//! # Examples
//!
//! ```
//! use sift_store::{TextIndex, embedding::HashedEmbeddingModel};
//!
//! let mut index = TextIndex::new(HashedEmbeddingModel::new(512), 3);
//! index.add(0, "Karl Benz patented the first practical automobile.").unwrap();
//! index.add(1, "Wheat is ground into flour.").unwrap();
//! index.add(2, "Henry Ford introduced the assembly line for automobiles.").unwrap();
//!
//! let hits = index.search("automobile history", 1, 64).unwrap();
//! assert_eq!(hits.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod vector_index;

use embedding::{EmbeddingError, EmbeddingModel};
use thiserror::Error;
use tracing::debug;
use vector_index::{VectorIndex, VectorIndexError};

/// Errors from the text index
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index rejected the operation
    #[error("Vector index error: {0}")]
    Index(#[from] VectorIndexError),
}

/// Similarity index over texts
///
/// Pairs an `EmbeddingModel` with a `VectorIndex`; callers only deal in keys
/// and strings.
pub struct TextIndex<M: EmbeddingModel> {
    model: M,
    index: VectorIndex,
}

impl<M: EmbeddingModel> TextIndex<M> {
    /// Create an index expecting about `capacity` texts
    pub fn new(model: M, capacity: usize) -> Self {
        let index = VectorIndex::with_capacity(model.dimension(), capacity);
        Self { model, index }
    }

    /// Embed and insert `text` under `key`
    pub fn add(&mut self, key: usize, text: &str) -> Result<(), StoreError> {
        let embedding = self.model.embed(text)?;
        self.index.add(key, &embedding)?;
        debug!("Indexed key {} ({} chars)", key, text.len());
        Ok(())
    }

    /// Return up to `k` `(key, similarity)` pairs, most similar first
    pub fn search(&self, query: &str, k: usize, ef_search: usize) -> Result<Vec<(usize, f32)>, StoreError> {
        let embedding = self.model.embed(query)?;
        Ok(self.index.search(&embedding, k, ef_search)?)
    }

    /// Number of indexed texts
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether nothing has been indexed
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
