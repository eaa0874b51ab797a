//! Command implementations.

pub mod chunk;
pub mod extract;
pub mod schema;

pub use self::chunk::execute_chunk;
pub use self::extract::execute_extract;
pub use self::schema::execute_schema;

use crate::cli::{ChunkOverrides, UnitArg};
use crate::error::Result;
use sift_domain::Document;
use sift_extractor::{ChunkConfig, ChunkUnit, ExtractionSchema};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Read the input document from a file, or stdin when the path is absent or "-".
pub(crate) fn read_document(input: Option<&Path>) -> Result<Document> {
    match input {
        Some(path) if path != Path::new("-") => {
            let text = std::fs::read_to_string(path)?;
            Ok(Document::new(text).with_metadata("source", path.display().to_string()))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(Document::new(text).with_metadata("source", "stdin"))
        }
    }
}

/// Load a schema file, or the built-in key developments schema.
pub(crate) fn load_schema(path: Option<&PathBuf>) -> Result<ExtractionSchema> {
    match path {
        Some(path) => Ok(ExtractionSchema::from_file(path)?),
        None => Ok(ExtractionSchema::key_developments()),
    }
}

/// Apply command-line chunking overrides.
pub(crate) fn apply_chunk_overrides(chunk: &mut ChunkConfig, overrides: &ChunkOverrides) {
    if let Some(size) = overrides.chunk_size {
        chunk.max_units = size;
    }
    if let Some(overlap) = overrides.overlap {
        chunk.overlap = overlap;
    }
    if let Some(unit) = overrides.unit {
        chunk.unit = match unit {
            UnitArg::Words => ChunkUnit::Words,
            UnitArg::Graphemes => ChunkUnit::Graphemes,
        };
    }
}
