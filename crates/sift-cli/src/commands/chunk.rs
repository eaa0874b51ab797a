//! Chunk command implementation.

use super::{apply_chunk_overrides, read_document};
use crate::cli::ChunkArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use sift_domain::Segment;
use sift_extractor::{ChunkConfig, Chunker};

/// Execute the chunk command.
pub fn execute_chunk(args: ChunkArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let document = read_document(args.input.as_deref())?;
    let segments = chunk_text(document.content(), &config.extractor.chunk, &args)?;
    println!("{}", formatter.format_segments(&segments)?);
    Ok(())
}

/// Split `text` with the configured chunking and any overrides from `args`.
pub fn chunk_text(text: &str, base: &ChunkConfig, args: &ChunkArgs) -> Result<Vec<Segment>> {
    let mut chunk = base.clone();
    apply_chunk_overrides(&mut chunk, &args.chunking);
    let chunker = Chunker::from_config(&chunk)?;
    Ok(chunker.chunk(text))
}
