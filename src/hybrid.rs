//! Hybrid retrieval over multiple weighted strategies
//!
//! Holds an ordered list of sub-retrievers (keyword, vector, or any other
//! [`Retriever`] implementation, including adapters for remote services) with
//! a parallel weight list. `process` fans the identical document set out to
//! every sub-retriever; `query` oversamples candidates from each and fuses
//! them into one ranking.

use crate::config::RetrievalConfig;
use crate::fusion::{
    reciprocal_rank_fusion, round_robin_fusion, weighted_score_fusion, FusionMethod,
    DEFAULT_RRF_K,
};
use crate::retriever::{ProcessOptions, QueryOptions, Retriever};
use crate::types::{Document, ScoredDocument};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Candidate multiplier applied to each sub-retriever's `top_k`
///
/// Oversampling gives fusion enough material to reorder correctly: a document
/// ranked just outside one retriever's top-k can still win the fused ranking.
pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 2;

/// Retriever that fuses rankings from several weighted sub-retrievers
pub struct HybridRetriever {
    retrievers: Vec<Arc<dyn Retriever>>,
    weights: Vec<f32>,
    rrf_k: f32,
    oversample_factor: usize,
}

impl HybridRetriever {
    /// Create an empty hybrid retriever; add strategies with `add_retriever`
    pub fn new() -> Self {
        Self {
            retrievers: Vec::new(),
            weights: Vec::new(),
            rrf_k: DEFAULT_RRF_K,
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
        }
    }

    /// Create a hybrid retriever over existing strategies
    ///
    /// `weights` may be omitted (every retriever gets 1.0). A weight list
    /// whose length diverges from the retriever list resets all weights to
    /// 1.0 with a warning, not an error.
    pub fn with_retrievers(
        retrievers: Vec<Arc<dyn Retriever>>,
        weights: Option<Vec<f32>>,
    ) -> Self {
        let weights = match weights {
            Some(w) if w.len() == retrievers.len() => w,
            Some(w) => {
                warn!(
                    "Weight count {} does not match retriever count {}; resetting all weights to 1.0",
                    w.len(),
                    retrievers.len()
                );
                vec![1.0; retrievers.len()]
            }
            None => vec![1.0; retrievers.len()],
        };

        Self {
            retrievers,
            weights,
            rrf_k: DEFAULT_RRF_K,
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
        }
    }

    /// Apply fusion tunables from configuration
    pub fn with_config(mut self, config: &RetrievalConfig) -> Self {
        self.rrf_k = config.rrf_k;
        self.oversample_factor = config.oversample_factor;
        self
    }

    /// Append a sub-retriever with its weight
    pub fn add_retriever(&mut self, retriever: Arc<dyn Retriever>, weight: f32) {
        self.retrievers.push(retriever);
        self.weights.push(weight);
    }

    /// Number of sub-retrievers
    pub fn len(&self) -> usize {
        self.retrievers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retrievers.is_empty()
    }
}

impl Default for HybridRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl Retriever for HybridRetriever {
    fn name(&self) -> &str {
        "hybrid"
    }

    fn process(&self, documents: &[Document], options: &ProcessOptions) -> Result<()> {
        // Every sub-retriever builds a fully independent index over the
        // identical corpus; a failure aborts the whole call
        for retriever in &self.retrievers {
            retriever.process(documents, options)?;
        }

        info!(
            documents = documents.len(),
            retrievers = self.retrievers.len(),
            "Processed documents through all sub-retrievers"
        );
        Ok(())
    }

    fn query(&self, query: &str, options: &QueryOptions) -> Result<Vec<ScoredDocument>> {
        if self.retrievers.is_empty() {
            return Ok(Vec::new());
        }

        let sub_options = options
            .clone()
            .with_top_k(options.top_k.saturating_mul(self.oversample_factor));

        let mut ranked_lists: Vec<(Vec<ScoredDocument>, f32)> =
            Vec::with_capacity(self.retrievers.len());
        for (retriever, &weight) in self.retrievers.iter().zip(self.weights.iter()) {
            let results = retriever.query(query, &sub_options)?;
            debug!(
                retriever = retriever.name(),
                candidates = results.len(),
                weight,
                "Collected fusion candidates"
            );
            ranked_lists.push((results, weight));
        }

        let fused = match options.fusion_method {
            FusionMethod::ReciprocalRank => {
                reciprocal_rank_fusion(&ranked_lists, options.top_k, self.rrf_k)
            }
            FusionMethod::WeightedScore => weighted_score_fusion(&ranked_lists, options.top_k),
            FusionMethod::RoundRobin => round_robin_fusion(&ranked_lists, options.top_k),
        };

        debug!(
            method = options.fusion_method.as_str(),
            results = fused.len(),
            "Fused hybrid query '{}'",
            query
        );
        Ok(fused)
    }
}
