//! RankFuse: pluggable multi-strategy document retrieval
//!
//! Given a corpus of text-bearing records and a free-text query, returns a
//! ranked subset of records, featuring:
//! - A common retriever contract (`process` an index, then `query` it)
//! - BM25 keyword retrieval over tokenized corpus statistics
//! - Vector retrieval via external embeddings or a TF-IDF fallback
//! - Hybrid retrieval fusing weighted sub-retrievers (RRF, weighted score,
//!   round robin)
//!
//! Everything is synchronous and in-memory: a `process` call snapshots the
//! corpus into a fresh index, `query` reads it, and the next `process`
//! replaces it wholesale. The library is the retrieval core behind a chat
//! context-augmentation pipeline but carries no I/O surface of its own.

pub mod bm25;
pub mod config;
pub mod embedding;
pub mod fusion;
pub mod hybrid;
pub mod retriever;
pub mod tokenize;
pub mod types;
pub mod vector;
pub mod vectorizer;

pub use bm25::Bm25Retriever;
pub use config::{Bm25Config, Config, RetrievalConfig, VectorConfig};
pub use embedding::{Embedder, HashEmbedder};
pub use fusion::FusionMethod;
pub use hybrid::HybridRetriever;
pub use retriever::{ProcessOptions, QueryOptions, Retriever, RetrieverError, DEFAULT_TOP_K};
pub use tokenize::Tokenizer;
pub use types::{Document, ScoredDocument};
pub use vector::VectorRetriever;
