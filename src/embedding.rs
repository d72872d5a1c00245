//! Embedding seam for the vector retriever
//!
//! The retrieval core never computes semantic embeddings itself. Callers
//! plug in an [`Embedder`] backed by whatever model serves them (an HTTP
//! embedding API, an in-process ONNX session); when none is supplied the
//! vector retriever falls back to a corpus-fit TF-IDF vectorizer instead.

use crate::types::Embedding;
use anyhow::Result;
use sha2::{Digest, Sha256};
use std::fmt::Debug;

/// Trait for external embedding functions
///
/// Object-safe so retrievers can hold `Arc<dyn Embedder>`. The same embedder
/// instance must serve both `process` and `query` so documents and queries
/// land in the same vector space.
pub trait Embedder: Send + Sync + Debug {
    /// Generate an embedding for a single text
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for a batch of texts
    ///
    /// The default implementation calls `embed` per text; backends with real
    /// batch endpoints should override it.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embedding dimensionality
    fn dimensions(&self) -> usize;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Deterministic hash-based embedder
///
/// Produces embeddings that are stable for identical content but carry no
/// semantic meaning. Useful for tests and offline wiring; never a substitute
/// for a real embedding model. Values are L2-normalized.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();

        let mut embedding = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let byte = hash[i % hash.len()];
            embedding.push((byte as f32 / 255.0) * 2.0 - 1.0);
        }

        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in embedding.iter_mut() {
                *value /= norm;
            }
        }

        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("dogs are loyal").unwrap();
        let b = embedder.embed("dogs are loyal").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_embedder_distinguishes_content() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("dogs").unwrap();
        let b = embedder.embed("stocks").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_embedder_output_is_normalized() {
        let embedder = HashEmbedder::new(32);
        let v = embedder.embed("anything").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_embed_batch_default_impl() {
        let embedder = HashEmbedder::new(16);
        let texts = vec!["one".to_string(), "two".to_string()];
        let batch = embedder.embed_batch(&texts).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("one").unwrap());
    }
}
