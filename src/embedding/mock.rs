//! Deterministic offline embedding provider for tests.
//!
//! Tokens are hashed into a fixed number of buckets (signed feature hashing) and
//! the result is L2-normalized, so texts sharing words land close together.

use super::EmbeddingProvider;
use anyhow::Result;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dimension: usize,
    /// Any batch containing a text with this marker fails to embed.
    pub fail_marker: Option<String>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            dimension: 64,
            fail_marker: None,
        }
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let bucket = u64::from_le_bytes([
                digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6],
                digest[7],
            ]) as usize
                % self.dimension;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl EmbeddingProvider for MockEmbedder {
    fn embed_many(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if let Some(marker) = &self.fail_marker
            && texts.iter().any(|t| t.contains(marker.as_str()))
        {
            anyhow::bail!("mock embedder refused text containing '{}'", marker);
        }
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f32>().sqrt()
    }

    #[test]
    fn deterministic_and_fixed_length() {
        let embedder = MockEmbedder::new(32);
        let a = embedder.embed("def f(): pass").unwrap();
        let b = embedder.embed("def f(): pass").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn shared_words_are_closer() {
        let embedder = MockEmbedder::new(256);
        let query = embedder.embed("parse config file").unwrap();
        let near = embedder.embed("fn parse_config() reads the config file").unwrap();
        let far = embedder.embed("render button color").unwrap();
        assert!(l2(&query, &near) < l2(&query, &far));
    }

    #[test]
    fn failing_marker() {
        let embedder = MockEmbedder::default().failing_on("BOOM");
        assert!(embedder.embed_many(vec!["fine".into()]).is_ok());
        assert!(embedder.embed_many(vec!["fine".into(), "BOOM".into()]).is_err());
    }
}
