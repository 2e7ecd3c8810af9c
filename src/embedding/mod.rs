mod fastembed_manager;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use fastembed_manager::{FastEmbedManager, resolve_model};

use anyhow::Result;

/// Trait for embedding generation
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of text, one vector per input in order
    fn embed_many(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Generate the embedding of a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_many(vec![text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Embedding provider returned no vector"))
    }

    /// Get the dimension of the embeddings
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}
