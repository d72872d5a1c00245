//! The common retriever contract
//!
//! Every retrieval strategy implements [`Retriever`]: build an index from a
//! document snapshot with `process`, then answer ranked queries against it
//! with `query`. The trait is object-safe so heterogeneous strategies,
//! including adapters for remote retrieval services, can sit side by side
//! inside a hybrid retriever.

use crate::config::{Config, RetrievalConfig};
use crate::fusion::FusionMethod;
use crate::types::{Document, ScoredDocument, DEFAULT_TEXT_FIELD};
use anyhow::Result;

/// Conventional result count for [`Retriever::get_relevant_documents`] and
/// the `top_k` default in [`QueryOptions`]
pub const DEFAULT_TOP_K: usize = 5;

/// Errors for contract violations
///
/// A retriever that does not override `process`/`query` fails immediately and
/// loudly when invoked. This is a programming defect signal, never a
/// condition a caller should retry or recover from.
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// The invoked capability was never implemented by this retriever
    #[error("retriever [{retriever}] is missing the required \"{operation}\" capability")]
    Unimplemented {
        retriever: String,
        operation: &'static str,
    },
}

/// Options forwarded to `process`
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Document field holding the text to index
    pub text_field: String,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            text_field: DEFAULT_TEXT_FIELD.to_string(),
        }
    }
}

impl ProcessOptions {
    pub fn with_text_field(mut self, field: impl Into<String>) -> Self {
        self.text_field = field.into();
        self
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            text_field: config.text_field.clone(),
        }
    }
}

/// Options forwarded to `query`
///
/// One options struct travels through the whole retriever tree: the hybrid
/// retriever forwards it to every sub-retriever, each of which reads the
/// fields it understands (`threshold` only matters to the vector retriever,
/// `fusion_method` only to the hybrid one).
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum number of results to return
    pub top_k: usize,
    /// Minimum similarity for vector retrieval results
    pub threshold: f32,
    /// Fusion algorithm for hybrid retrieval
    pub fusion_method: FusionMethod,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            threshold: 0.0,
            fusion_method: FusionMethod::default(),
        }
    }
}

impl QueryOptions {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_fusion_method(mut self, method: FusionMethod) -> Self {
        self.fusion_method = method;
        self
    }

    /// Build query options from configuration: `default_top_k`, the vector
    /// similarity threshold, and the default fusion method
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.default_top_k,
            threshold: config.vector.threshold,
            fusion_method: config.retrieval.fusion_method,
        }
    }
}

/// Core trait for retrieval strategies
///
/// Implementations keep their index behind interior mutability so `process`
/// takes `&self` and instances stay shareable. A `process` call fully
/// replaces any prior index; `query` never mutates it. Querying before any
/// `process` returns an empty result, not an error. Callers must serialize
/// `process` against concurrent `query` calls on the same instance; concurrent
/// queries against a stable index are safe as independent reads.
pub trait Retriever: Send + Sync {
    /// Strategy name for logging and diagnostics
    fn name(&self) -> &str;

    /// Build the index from a document snapshot, replacing any prior index
    fn process(&self, _documents: &[Document], _options: &ProcessOptions) -> Result<()> {
        Err(RetrieverError::Unimplemented {
            retriever: self.name().to_string(),
            operation: "process",
        }
        .into())
    }

    /// Return up to `top_k` documents ranked by relevance, highest first
    fn query(&self, _query: &str, _options: &QueryOptions) -> Result<Vec<ScoredDocument>> {
        Err(RetrieverError::Unimplemented {
            retriever: self.name().to_string(),
            operation: "query",
        }
        .into())
    }

    /// Convenience alias for `query` with otherwise-default options; pass
    /// [`DEFAULT_TOP_K`] for the conventional result count
    fn get_relevant_documents(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        self.query(query, &QueryOptions::default().with_top_k(top_k))
    }
}
