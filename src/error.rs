/// Centralized error types for code-embedder using thiserror
///
/// Fatal failures (model initialization, git checkout/restore, store connection)
/// abort the build. Per-file failures are logged and counted; [`is_fatal_error`]
/// tells the two apart.
use thiserror::Error;

/// Main error type for the embedder
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector database error: {0}")]
    VectorDb(#[from] VectorDbError),

    #[error("Indexing error: {0}")]
    Indexing(#[from] IndexingError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    InitializationFailed(String),

    #[error("Unsupported embedding model: {0}")]
    UnsupportedModel(String),

    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model lock was poisoned: {0}")]
    LockPoisoned(String),
}

/// Errors related to vector store operations
#[derive(Error, Debug)]
pub enum VectorDbError {
    #[error("Failed to connect to vector store at '{path}': {reason}")]
    ConnectionFailed { path: String, reason: String },

    #[error("Failed to create collection '{collection}': {reason}")]
    CollectionCreationFailed { collection: String, reason: String },

    #[error("Chunk count ({chunks}) does not match vector count ({vectors})")]
    LengthMismatch { chunks: usize, vectors: usize },

    #[error("Refusing to delete with an empty metadata filter")]
    EmptyFilter,

    #[error("Failed to store records: {0}")]
    StoreFailed(String),

    #[error("Failed to search collection: {0}")]
    SearchFailed(String),

    #[error("Failed to delete records: {0}")]
    DeleteFailed(String),
}

/// Errors related to file discovery
#[derive(Error, Debug)]
pub enum IndexingError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Failed to walk directory: {0}")]
    WalkFailed(String),

    #[error("Failed to read file '{file}': {reason}")]
    FileReadFailed { file: String, reason: String },
}

/// Errors related to text chunking
#[derive(Error, Debug)]
pub enum ChunkingError {
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid commit hash '{0}': only ASCII letters, digits, '_', '-' and '.' are allowed")]
    InvalidCommitHash(String),

    #[error("{field} must be {constraint}, got {actual}")]
    ConstraintViolation {
        field: String,
        constraint: String,
        actual: String,
    },

    #[error("Empty {0}")]
    Empty(String),
}

/// Errors related to git operations
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git repository not found at: {0}")]
    RepoNotFound(String),

    #[error("Repository at '{0}' has no working directory")]
    BareRepository(String),

    #[error("Failed to resolve HEAD: {0}")]
    HeadUnresolved(String),

    #[error("Revision '{rev}' not found: {reason}")]
    RevisionNotFound { rev: String, reason: String },

    #[error("git {operation} {target} failed: {reason}")]
    CommandFailed {
        operation: String,
        target: String,
        reason: String,
    },

    #[error("Failed to restore HEAD to {target}: {reason}")]
    RestoreFailed { target: String, reason: String },

    #[error("Failed to export commit {commit} to '{dest}': {reason}")]
    ExportFailed {
        commit: String,
        dest: String,
        reason: String,
    },
}

impl EmbedderError {
    /// Errors that abort the whole pipeline instead of skipping a single file
    pub fn is_fatal(&self) -> bool {
        match self {
            EmbedderError::Embedding(e) => e.is_fatal(),
            EmbedderError::VectorDb(e) => e.is_fatal(),
            EmbedderError::Git(_) | EmbedderError::Config(_) => true,
            EmbedderError::Indexing(_)
            | EmbedderError::Chunking(_)
            | EmbedderError::Validation(_) => false,
        }
    }
}

impl EmbeddingError {
    /// A broken model fails every file the same way
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EmbeddingError::GenerationFailed(_))
    }
}

impl VectorDbError {
    /// The store itself is unusable, not just one write
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VectorDbError::ConnectionFailed { .. } | VectorDbError::CollectionCreationFailed { .. }
        )
    }
}

/// Whether any error in the chain of `err` is fatal
pub fn is_fatal_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<EmbedderError>() {
            e.is_fatal()
        } else if let Some(e) = cause.downcast_ref::<EmbeddingError>() {
            e.is_fatal()
        } else if let Some(e) = cause.downcast_ref::<VectorDbError>() {
            e.is_fatal()
        } else {
            cause.is::<GitError>() || cause.is::<ConfigError>()
        }
    })
}
