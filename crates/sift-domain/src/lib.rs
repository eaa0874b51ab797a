//! Sift Domain Layer
//!
//! This crate contains the core domain model for Sift. It has no external
//! dependencies beyond `uuid` and defines the value objects and trait
//! interfaces that the infrastructure and application crates build upon.
//!
//! ## Key Concepts
//!
//! - **Document**: Raw text plus key-value metadata, immutable once loaded
//! - **Segment**: A bounded, overlapping slice of a document's text
//! - **ExtractedRecord**: A schema-conforming record produced from one segment
//! - **LlmProvider**: The boundary to an external structured-output model
//!
//! ## Architecture
//!
//! - No knowledge of HTTP, JSON or vector indexes
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod record;
pub mod segment;
pub mod traits;

// Re-exports for convenience
pub use document::{Document, DocumentId};
pub use record::{ExtractedRecord, FieldValue};
pub use segment::Segment;
