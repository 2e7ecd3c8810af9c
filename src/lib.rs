//! # Code Embedder - Commit-Scoped Semantic Code Search
//!
//! Embeds the source and documentation files of a git working tree into a local
//! LanceDB store, one collection per commit hash, and answers natural-language
//! queries against the collection of any commit.
//!
//! ## Overview
//!
//! Searching a commit that was never embedded builds its collection first, either
//! by checking the commit out and restoring the original HEAD afterwards, or by
//! exporting the commit's tree to a scratch directory.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  code-embedder  │  (embed / search)
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  CodeEmbedder   │  (build, search, lazy build)
//! └────────┬────────┘
//!          │
//!    ┌─────┴─────┬──────────┬─────────────┐
//!    │           │          │             │
//! ┌──▼──┐  ┌─────▼────┐  ┌──▼──┐   ┌──────▼─────┐
//! │FastE│  │ LanceDB  │  │ git │   │  Indexer   │
//! │mbed │  │(per hash)│  │(git2│   │(walk/chunk)│
//! └─────┘  └──────────┘  └─────┘   └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`client`]: The [`CodeEmbedder`] manager tying the pieces together
//! - [`embedding`]: Embedding generation using FastEmbed
//! - [`vector_db`]: Commit-keyed LanceDB collections
//! - [`indexer`]: File collection and overlapping text chunking
//! - [`git`]: HEAD resolution, temporary checkout and tree export
//! - [`config`]: Configuration with file, `.env` and environment overrides
//! - [`types`]: Request, response and record types
//! - [`error`]: Error types
//! - [`paths`]: Platform-specific default locations
//!
//! ## Usage Example
//!
//! ```no_run
//! use code_embedder::{CodeEmbedder, SearchRequest};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CodeEmbedder::new().await?;
//!
//!     // Builds the HEAD collection first if it does not exist yet
//!     let response = client
//!         .search_code(SearchRequest {
//!             query: "where is the retry loop".to_string(),
//!             commit: None,
//!             k: 5,
//!             workdir: PathBuf::from("."),
//!         })
//!         .await?;
//!
//!     for hit in response.results {
//!         println!("{}: {:.4}", hit.source, hit.distance);
//!     }
//!     Ok(())
//! }
//! ```

/// Commit-scoped index manager
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding generation using FastEmbed
pub mod embedding;

/// Error types and utilities
pub mod error;

/// HEAD resolution, temporary checkout and commit tree export
pub mod git;

/// File collection and text chunking
pub mod indexer;

/// Platform-specific default directories
pub mod paths;

/// Request, response and record types
pub mod types;

/// Commit-keyed vector collections on LanceDB
pub mod vector_db;

pub use client::CodeEmbedder;
pub use config::{Config, LazyBuildStrategy};
pub use embedding::{EmbeddingProvider, FastEmbedManager};
pub use error::EmbedderError;
pub use types::{
    DocumentChunk, EmbedReport, EmbedRequest, MetadataFilter, SearchHit, SearchRequest,
    SearchResponse,
};
