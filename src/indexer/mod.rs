//! File discovery and text chunking
//!
//! Collects the source and documentation files of a directory tree and splits
//! their content into overlapping windows for embedding.

mod chunker;
mod file_walker;

pub use chunker::TextChunker;
pub use file_walker::{FileCollector, file_type_of, relative_source};
