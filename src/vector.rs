//! Vector similarity retrieval
//!
//! Indexes one embedding per document and scores queries by cosine
//! similarity. Embeddings come from an external [`Embedder`] when one is
//! supplied; otherwise a TF-IDF vectorizer is fit over the corpus during
//! `process` and retained for transforming queries. Every `process` call
//! rebuilds vectors and refits the fallback vectorizer from scratch.

use crate::config::VectorConfig;
use crate::embedding::Embedder;
use crate::retriever::{ProcessOptions, QueryOptions, Retriever};
use crate::types::{Document, Embedding, ScoredDocument};
use crate::vectorizer::TfidfVectorizer;
use anyhow::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Retriever scoring documents by cosine similarity of embeddings
pub struct VectorRetriever {
    embedder: Option<Arc<dyn Embedder>>,
    collection_name: String,
    min_token_len: usize,
    index: RwLock<Option<VectorIndex>>,
}

/// One index generation: documents, their vectors, and (on the fallback
/// path) the vectorizer that produced them
struct VectorIndex {
    documents: Vec<Document>,
    embeddings: Vec<Embedding>,
    /// Present only when no external embedder was supplied; queries reuse it
    /// via `transform`, never refitting
    vectorizer: Option<TfidfVectorizer>,
}

impl VectorRetriever {
    /// Create a retriever using the TF-IDF fallback path
    pub fn new() -> Self {
        Self::with_config(VectorConfig::default(), None)
    }

    /// Create a retriever backed by an external embedder
    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(VectorConfig::default(), Some(embedder))
    }

    /// Create a retriever from configuration
    pub fn with_config(config: VectorConfig, embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self {
            embedder,
            collection_name: config.collection_name,
            min_token_len: config.min_token_len,
            index: RwLock::new(None),
        }
    }

    fn embed_query(&self, index: &VectorIndex, query: &str) -> Result<Embedding> {
        if let Some(embedder) = &self.embedder {
            return embedder.embed(query);
        }
        // The fallback vectorizer is always present when no embedder was
        // configured and an index exists
        let Some(vectorizer) = &index.vectorizer else {
            return Ok(Vec::new());
        };
        Ok(vectorizer.transform(query))
    }
}

impl Default for VectorRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl Retriever for VectorRetriever {
    fn name(&self) -> &str {
        "vector"
    }

    fn process(&self, documents: &[Document], options: &ProcessOptions) -> Result<()> {
        let texts: Vec<&str> = documents
            .iter()
            .map(|doc| doc.text(&options.text_field))
            .collect();

        let (embeddings, vectorizer) = match &self.embedder {
            Some(embedder) => {
                let mut vectors = Vec::with_capacity(texts.len());
                for text in &texts {
                    vectors.push(embedder.embed(text)?);
                }
                (vectors, None)
            }
            None => {
                // Refit from scratch; any previously fitted vectorizer is
                // discarded together with the old index
                let vectorizer = TfidfVectorizer::fit(&texts, self.min_token_len);
                let vectors = texts.iter().map(|t| vectorizer.transform(t)).collect();
                (vectors, Some(vectorizer))
            }
        };

        info!(
            collection = %self.collection_name,
            documents = documents.len(),
            backend = self.embedder.as_ref().map_or("tfidf", |e| e.name()),
            "Built vector index"
        );

        *self.index.write() = Some(VectorIndex {
            documents: documents.to_vec(),
            embeddings,
            vectorizer,
        });
        Ok(())
    }

    fn query(&self, query: &str, options: &QueryOptions) -> Result<Vec<ScoredDocument>> {
        let guard = self.index.read();
        let Some(index) = guard.as_ref() else {
            return Ok(Vec::new());
        };
        if index.documents.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embed_query(index, query)?;

        let mut scored: Vec<(usize, f32)> = index
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, embedding)| (i, cosine_similarity(&query_embedding, embedding)))
            .collect();

        // Stable sort: similarity ties preserve corpus order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut results = Vec::new();
        for (i, similarity) in scored {
            if similarity < options.threshold || results.len() >= options.top_k {
                break;
            }
            results.push(ScoredDocument::new(index.documents[i].clone(), similarity));
        }

        debug!("Vector query '{}': {} results", query, results.len());
        Ok(results)
    }
}

/// Cosine similarity between two vectors; 0.0 on length mismatch or zero norm
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
