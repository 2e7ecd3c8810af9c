/// Configuration system for code-embedder
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables (including `.env`) > Config file > Defaults
use crate::error::{ConfigError, EmbedderError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "CODE_EMBEDDER_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Vector store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// File discovery and chunking configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one collection per commit hash
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,

    /// Collection names are `{collection_prefix}{commit_hash}`
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "sentence-transformers/all-MiniLM-L6-v2", "BAAI/bge-small-en-v1.5")
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Local directory model weights are downloaded to
    #[serde(default = "default_model_cache_dir")]
    pub cache_dir: PathBuf,

    /// Batch size for embedding generation
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Show a progress bar while model weights download
    #[serde(default = "default_show_download_progress")]
    pub show_download_progress: bool,
}

/// File discovery and chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Allowed file extensions, including the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names pruned from the walk
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results
    #[serde(default = "default_k")]
    pub k: usize,

    /// Characters of chunk content shown per result
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// How a missing collection is built when searched
    #[serde(default)]
    pub lazy_build: LazyBuildStrategy,

    /// Scratch directory commit trees are exported to by the snapshot strategy
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

/// How the search path builds a collection for a commit that was never embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LazyBuildStrategy {
    /// Check the commit out in the working tree, build, then restore HEAD
    #[default]
    Checkout,
    /// Export the commit's tree to a scratch directory and build from there
    Snapshot,
}

impl fmt::Display for LazyBuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyBuildStrategy::Checkout => write!(f, "checkout"),
            LazyBuildStrategy::Snapshot => write!(f, "snapshot"),
        }
    }
}

impl FromStr for LazyBuildStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "checkout" => Ok(LazyBuildStrategy::Checkout),
            "snapshot" => Ok(LazyBuildStrategy::Snapshot),
            other => Err(ConfigError::InvalidValue {
                key: "search.lazy_build".to_string(),
                reason: format!("must be 'checkout' or 'snapshot', got '{}'", other),
            }),
        }
    }
}

// Default value functions
fn default_persist_dir() -> PathBuf {
    PathBuf::from("./chroma_db")
}

fn default_collection_prefix() -> String {
    "code_embeddings_".to_string()
}

fn default_model_name() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_model_cache_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_model_cache_dir()
}

fn default_batch_size() -> usize {
    32
}

fn default_show_download_progress() -> bool {
    true
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_extensions() -> Vec<String> {
    [
        ".py", ".js", ".jsx", ".ts", ".tsx", ".html", ".css", ".scss", ".json", ".md",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

fn default_exclude_dirs() -> Vec<String> {
    [
        ".git",
        "node_modules",
        "__pycache__",
        ".venv",
        "coverage",
        ".vscode",
        ".idea",
        "code_embedder",
    ]
    .iter()
    .map(|dir| dir.to_string())
    .collect()
}

fn default_k() -> usize {
    5
}

fn default_preview_chars() -> usize {
    200
}

fn default_snapshot_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_snapshot_dir()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_dir: default_persist_dir(),
            collection_prefix: default_collection_prefix(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            cache_dir: default_model_cache_dir(),
            batch_size: default_batch_size(),
            show_download_progress: default_show_download_progress(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            preview_chars: default_preview_chars(),
            lazy_build: LazyBuildStrategy::default(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

/// Load a `.env` file from the working directory (or its parents) into the
/// process environment. A missing file is not an error.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Ignoring unreadable .env file: {}", e);
            None
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, EmbedderError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or fall back to defaults
    pub fn load_or_default() -> Result<Self, EmbedderError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::debug!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Name of the collection that holds the given commit's chunks
    pub fn collection_name(&self, commit_hash: &str) -> String {
        format!("{}{}", self.store.collection_prefix, commit_hash)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), EmbedderError> {
        if self.store.collection_prefix.is_empty() {
            return Err(invalid("store.collection_prefix", "must not be empty"));
        }

        if self.embedding.batch_size == 0 {
            return Err(invalid("embedding.batch_size", "must be greater than 0"));
        }

        if self.indexing.chunk_size == 0 {
            return Err(invalid("indexing.chunk_size", "must be greater than 0"));
        }

        if self.indexing.chunk_overlap >= self.indexing.chunk_size {
            return Err(invalid(
                "indexing.chunk_overlap",
                &format!(
                    "must be smaller than chunk_size ({}), got {}",
                    self.indexing.chunk_size, self.indexing.chunk_overlap
                ),
            ));
        }

        if self.indexing.extensions.is_empty() {
            return Err(invalid("indexing.extensions", "must not be empty"));
        }

        if let Some(ext) = self
            .indexing
            .extensions
            .iter()
            .find(|ext| !ext.starts_with('.'))
        {
            return Err(invalid(
                "indexing.extensions",
                &format!("extensions must start with '.', got '{}'", ext),
            ));
        }

        if self.search.k == 0 {
            return Err(invalid("search.k", "must be greater than 0"));
        }

        Ok(())
    }

    /// Apply `CODE_EMBEDDER_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup (keys include [`ENV_PREFIX`])
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(dir) = var("PERSIST_DIR") {
            self.store.persist_dir = PathBuf::from(dir);
        }

        if let Some(model) = var("MODEL") {
            self.embedding.model_name = model;
        }

        if let Some(dir) = var("MODEL_CACHE_DIR") {
            self.embedding.cache_dir = PathBuf::from(dir);
        }

        if let Some(batch_size) = var("BATCH_SIZE") {
            match batch_size.parse() {
                Ok(size) => self.embedding.batch_size = size,
                Err(_) => tracing::warn!("Ignoring invalid {}BATCH_SIZE: {}", ENV_PREFIX, batch_size),
            }
        }

        if let Some(chunk_size) = var("CHUNK_SIZE") {
            match chunk_size.parse() {
                Ok(size) => self.indexing.chunk_size = size,
                Err(_) => tracing::warn!("Ignoring invalid {}CHUNK_SIZE: {}", ENV_PREFIX, chunk_size),
            }
        }

        if let Some(overlap) = var("CHUNK_OVERLAP") {
            match overlap.parse() {
                Ok(size) => self.indexing.chunk_overlap = size,
                Err(_) => tracing::warn!("Ignoring invalid {}CHUNK_OVERLAP: {}", ENV_PREFIX, overlap),
            }
        }

        if let Some(dir) = var("SNAPSHOT_DIR") {
            self.search.snapshot_dir = PathBuf::from(dir);
        }

        if let Some(strategy) = var("LAZY_BUILD") {
            match strategy.parse() {
                Ok(strategy) => self.search.lazy_build = strategy,
                Err(e) => tracing::warn!("Ignoring {}LAZY_BUILD: {}", ENV_PREFIX, e),
            }
        }
    }

    /// Create a new Config from the config file, then environment overrides
    pub fn new() -> Result<Self, EmbedderError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

fn invalid(key: &str, reason: &str) -> EmbedderError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
