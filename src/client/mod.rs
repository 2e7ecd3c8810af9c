//! Commit-scoped index manager
//!
//! [`CodeEmbedder`] builds one collection per commit hash and searches it, building
//! a missing collection on demand.

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, FastEmbedManager};
use crate::indexer::TextChunker;
use crate::types::{EmbedReport, EmbedRequest, SearchRequest, SearchResponse};
use crate::vector_db::LanceVectorStore;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Build path: collect, chunk, embed and store one directory under a commit
pub(crate) mod indexing;
/// Search path, including the lazy build of a missing collection
pub(crate) mod search;

/// Main client for embedding a codebase per commit and searching it
///
/// # Example
///
/// ```no_run
/// use code_embedder::{CodeEmbedder, Config, EmbedRequest, SearchRequest};
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = CodeEmbedder::with_config(Config::default()).await?;
///
///     let report = client
///         .create_embeddings(EmbedRequest {
///             directory: PathBuf::from("."),
///             commit: None,
///         })
///         .await?;
///     println!("Embedded {} files under {}", report.files_processed, report.commit_hash);
///
///     let response = client
///         .search_code(SearchRequest {
///             query: "parse the config file".to_string(),
///             commit: Some(report.commit_hash),
///             k: 5,
///             workdir: PathBuf::from("."),
///         })
///         .await?;
///     for hit in response.results {
///         println!("{} ({:.4})", hit.source, hit.distance);
///     }
///     Ok(())
/// }
/// ```
pub struct CodeEmbedder<E = FastEmbedManager> {
    pub(crate) embedding_provider: Arc<E>,
    pub(crate) vector_store: Arc<LanceVectorStore>,
    pub(crate) chunker: Arc<TextChunker>,
    pub(crate) config: Arc<Config>,
}

impl CodeEmbedder<FastEmbedManager> {
    /// Create a client from the config file and `CODE_EMBEDDER_*` environment
    pub async fn new() -> Result<Self> {
        let config = Config::new().context("Failed to load configuration")?;
        Self::with_config(config).await
    }

    /// Create a client backed by the configured FastEmbed model.
    ///
    /// Fails if the model cannot be loaded.
    pub async fn with_config(config: Config) -> Result<Self> {
        tracing::debug!("Embedding model: {}", config.embedding.model_name);

        let embedding_provider = FastEmbedManager::new(&config.embedding)
            .context("Failed to initialize embedding provider")?;
        Self::with_provider(config, embedding_provider).await
    }
}

impl<E: EmbeddingProvider + 'static> CodeEmbedder<E> {
    /// Create a client around any embedding provider
    pub async fn with_provider(config: Config, embedding_provider: E) -> Result<Self> {
        config.validate()?;

        tracing::debug!("Persist dir: {}", config.store.persist_dir.display());
        tracing::debug!(
            "Chunk size: {}, overlap: {}",
            config.indexing.chunk_size,
            config.indexing.chunk_overlap
        );

        let chunker = TextChunker::from_config(&config.indexing)?;
        let vector_store = LanceVectorStore::connect(&config.store.persist_dir)
            .await
            .context("Failed to open vector store")?;

        Ok(Self {
            embedding_provider: Arc::new(embedding_provider),
            vector_store: Arc::new(vector_store),
            chunker: Arc::new(chunker),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn embedding_provider(&self) -> &E {
        &self.embedding_provider
    }

    pub fn vector_store(&self) -> &LanceVectorStore {
        &self.vector_store
    }

    /// Embed every eligible file under `request.directory` into the collection of
    /// the requested (or current) commit.
    ///
    /// Re-running on the same commit replaces each file's records instead of
    /// duplicating them. Per-file failures are logged and reported, not returned.
    pub async fn create_embeddings(&self, request: EmbedRequest) -> Result<EmbedReport> {
        indexing::do_create_embeddings(self, &request.directory, request.commit.as_deref()).await
    }

    /// Search the collection of the requested (or current) commit, building it
    /// first if it is empty or missing
    pub async fn search_code(&self, request: SearchRequest) -> Result<SearchResponse> {
        search::do_search_code(self, request).await
    }

    /// Number of records stored for a commit
    pub async fn collection_count(&self, commit_hash: &str) -> Result<usize> {
        self.vector_store
            .count(&self.config.collection_name(commit_hash))
            .await
    }

    /// Embed texts on the blocking pool, `embedding.batch_size` at a time
    pub(crate) async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let batch_size = self.config.embedding.batch_size.max(1);
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            let provider = self.embedding_provider.clone();
            let batch = batch.to_vec();
            let embedded = tokio::task::spawn_blocking(move || provider.embed_many(batch))
                .await
                .context("Embedding task panicked")??;
            vectors.extend(embedded);
        }

        Ok(vectors)
    }
}

#[cfg(test)]
pub(crate) type MockClient = CodeEmbedder<crate::embedding::mock::MockEmbedder>;

#[cfg(test)]
impl MockClient {
    /// Client with the offline embedder and the given config (for testing)
    pub(crate) async fn with_mock(config: Config) -> Result<Self> {
        Self::with_provider(config, crate::embedding::mock::MockEmbedder::default()).await
    }
}

/// Default config with the store under `persist_dir` (for testing)
#[cfg(test)]
pub(crate) fn test_config(persist_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.store.persist_dir = persist_dir.to_path_buf();
    config
}
