use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One overlapping window of a source file, the unit of embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// The chunk text
    pub text: String,
    /// Path of the originating file relative to the embedded root, '/'-separated
    pub source: String,
    /// Extension of the originating file including the leading dot (e.g. ".py")
    pub file_type: String,
    /// Commit the chunk was embedded under
    pub commit_hash: String,
    /// Position of this chunk within its file
    pub chunk_index: usize,
}

/// Metadata filter for deleting records; every set field must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub source: Option<String>,
    pub commit_hash: Option<String>,
}

impl MetadataFilter {
    /// Filter matching every record of one file under one commit
    pub fn source_at_commit(source: impl Into<String>, commit_hash: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            commit_hash: Some(commit_hash.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.commit_hash.is_none()
    }
}

/// A single nearest-neighbour hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Stored chunk text
    pub text: String,
    /// Source file path relative to the embedded root
    pub source: String,
    /// File extension including the leading dot
    pub file_type: String,
    /// Commit the record was embedded under
    pub commit_hash: String,
    /// Distance between query and record in embedding space (lower is closer)
    pub distance: f32,
}

/// Request to embed a directory under a commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Root directory to collect files from
    pub directory: PathBuf,
    /// Commit to embed under; defaults to HEAD of the repository containing `directory`
    #[serde(default)]
    pub commit: Option<String>,
}

/// Outcome of a build pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedReport {
    /// Commit the collection is keyed by
    pub commit_hash: String,
    /// Name of the collection that was written
    pub collection: String,
    /// Number of files returned by the collector
    pub files_discovered: usize,
    /// Files whose chunks were stored
    pub files_processed: usize,
    /// Files that produced no chunks
    pub files_skipped: usize,
    /// Total records written
    pub chunks_stored: usize,
    /// Per-file failures, formatted as "path: error"
    #[serde(default)]
    pub errors: Vec<String>,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

/// Request to search the collection of a commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text
    pub query: String,
    /// Commit to search; defaults to HEAD of the repository containing `workdir`
    #[serde(default)]
    pub commit: Option<String>,
    /// Maximum number of results
    pub k: usize,
    /// Directory used to resolve HEAD and to build a missing collection from
    pub workdir: PathBuf,
}

/// Ranked search output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub commit_hash: String,
    /// Hits in ascending distance order
    pub results: Vec<SearchHit>,
    /// Present when the collection had to be built before searching
    #[serde(default)]
    pub lazy_build: Option<EmbedReport>,
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
