//! HNSW Vector Index for Similarity Search
//!
//! This module wraps the HNSW algorithm for nearest-neighbor search over
//! embedding vectors. Entries are addressed by caller-chosen `usize` keys
//! (segment indexes in the retrieval path).
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//!   Higher M = better accuracy but more memory
//! - **efConstruction**: Size of dynamic candidate list during construction (default: 200)
//!   Higher efConstruction = better index quality but slower build
//! - **efSearch**: Size of dynamic candidate list during search (passed per query)
//!   Higher efSearch = better recall but slower queries

use hnsw_rs::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 10_000;

/// Errors that can occur during vector index operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Key inserted twice
    #[error("Key {0} is already indexed")]
    DuplicateKey(usize),
}

/// A wrapper around HNSW for vector similarity search
///
/// # Examples
///
/// ```
/// use sift_store::vector_index::VectorIndex;
///
/// let mut index = VectorIndex::with_capacity(3, 2);
/// index.add(7, &[1.0, 0.0, 0.0]).unwrap();
/// index.add(9, &[0.0, 1.0, 0.0]).unwrap();
///
/// let results = index.search(&[1.0, 0.1, 0.0], 1, 64).unwrap();
/// assert_eq!(results[0].0, 7);
/// ```
pub struct VectorIndex {
    dimension: usize,
    hnsw: Hnsw<'static, f32, DistCosine>,
    /// Internal HNSW id -> caller key
    id_map: HashMap<usize, usize>,
    next_id: usize,
}

impl VectorIndex {
    /// Create a new vector index sized for a typical document
    pub fn new(dimension: usize) -> Self {
        Self::with_capacity(dimension, DEFAULT_MAX_ELEMENTS)
    }

    /// Create a new vector index expecting about `capacity` entries
    pub fn with_capacity(dimension: usize, capacity: usize) -> Self {
        let max_elements = capacity.max(1);
        let nb_layer = 16.min((max_elements as f32).ln().trunc() as usize).max(1);

        let hnsw = Hnsw::<'static, f32, DistCosine>::new(
            DEFAULT_M,
            max_elements,
            nb_layer,
            DEFAULT_EF_CONSTRUCTION,
            DistCosine {},
        );

        Self {
            dimension,
            hnsw,
            id_map: HashMap::new(),
            next_id: 0,
        }
    }

    /// Dimension of vectors accepted by this index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add an embedding under `key`
    pub fn add(&mut self, key: usize, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;
        if self.id_map.values().any(|&existing| existing == key) {
            return Err(VectorIndexError::DuplicateKey(key));
        }

        let internal_id = self.next_id;
        self.next_id += 1;
        self.id_map.insert(internal_id, key);

        let embedding_vec = embedding.to_vec();
        self.hnsw.insert((&embedding_vec, internal_id));

        Ok(())
    }

    /// Search for the k nearest neighbors to the given embedding
    ///
    /// Returns `(key, similarity)` pairs sorted by similarity, highest first.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(usize, f32)>, VectorIndexError> {
        self.check_dimension(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let k = k.min(self.len());
        let neighbours = self.hnsw.search(query, k, ef_search.max(k));

        let mut results: Vec<(usize, f32)> = neighbours
            .into_iter()
            .filter_map(|neighbour| {
                self.id_map
                    .get(&neighbour.d_id)
                    .map(|&key| (key, 1.0 - neighbour.distance))
            })
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.id_map.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}
