use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;
use anyhow::Result;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// FastEmbed-based embedding provider, running on CPU
pub struct FastEmbedManager {
    // `TextEmbedding::embed` takes `&mut self`
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_name: String,
    batch_size: usize,
}

/// Map a configured model name onto a fastembed model and its dimension.
///
/// Accepts the bare name or the hub-qualified one, case-insensitively.
pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    let normalized = name.trim().to_ascii_lowercase();
    let bare = normalized.rsplit('/').next().unwrap_or(&normalized);

    match bare {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-minilm-l12-v2" => Ok((EmbeddingModel::AllMiniLML12V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        _ => Err(EmbeddingError::UnsupportedModel(name.to_string())),
    }
}

impl FastEmbedManager {
    /// Load the configured model, downloading weights into the cache directory if needed.
    ///
    /// Any failure here is fatal for the pipeline.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model, dimension) = resolve_model(&config.model_name)?;

        tracing::info!(
            "Initializing embedding model {} (cache: {})",
            config.model_name,
            config.cache_dir.display()
        );

        std::fs::create_dir_all(&config.cache_dir).map_err(|e| {
            EmbeddingError::InitializationFailed(format!(
                "cannot create model cache directory {}: {}",
                config.cache_dir.display(),
                e
            ))
        })?;

        let mut options = InitOptions::new(model);
        options.cache_dir = config.cache_dir.clone();
        options.show_download_progress = config.show_download_progress;

        let embedding_model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitializationFailed(format!("{:#}", e)))?;

        Ok(Self {
            model: Mutex::new(embedding_model),
            dimension,
            model_name: config.model_name.clone(),
            batch_size: config.batch_size,
        })
    }
}

impl EmbeddingProvider for FastEmbedManager {
    fn embed_many(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut model = self
            .model
            .lock()
            .map_err(|e| EmbeddingError::LockPoisoned(e.to_string()))?;
        let embeddings = model
            .embed(texts, Some(self.batch_size))
            .map_err(|e| EmbeddingError::GenerationFailed(format!("{:#}", e)))?;

        if let Some(bad) = embeddings.iter().find(|v| v.len() != self.dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            }
            .into());
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
