//! Configuration for rankfuse retrievers

use crate::fusion::FusionMethod;
use crate::types::DEFAULT_TEXT_FIELD;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration, loadable from TOML
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Retrieval and fusion configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// BM25 keyword retriever configuration
    #[serde(default)]
    pub bm25: Bm25Config,
    /// Vector retriever configuration
    #[serde(default)]
    pub vector: VectorConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass rather than playing whack-a-mole.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.retrieval.text_field.is_empty() {
            errors.push("text_field must not be empty".to_string());
        }
        if self.retrieval.rrf_k <= 0.0 {
            errors.push("rrf_k must be positive".to_string());
        }
        if self.retrieval.oversample_factor == 0 {
            errors.push("oversample_factor must be at least 1".to_string());
        }

        if self.bm25.k1 <= 0.0 {
            errors.push("bm25 k1 must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            errors.push("bm25 b must be in [0, 1]".to_string());
        }
        if self.bm25.epsilon <= 0.0 {
            errors.push("bm25 epsilon must be positive".to_string());
        }

        if self.vector.min_token_len == 0 {
            errors.push("vector min_token_len must be at least 1".to_string());
        }
        if !(-1.0..=1.0).contains(&self.vector.threshold) {
            errors.push("vector threshold must be in [-1, 1]".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "))
        }
    }
}

/// Retrieval and fusion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Document field holding the text to index
    pub text_field: String,
    /// Default number of results per query
    pub default_top_k: usize,
    /// RRF damping constant
    pub rrf_k: f32,
    /// Candidate multiplier applied to each sub-retriever during fusion
    pub oversample_factor: usize,
    /// Default fusion algorithm for hybrid queries
    pub fusion_method: FusionMethod,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            default_top_k: 5,
            rrf_k: 60.0,
            oversample_factor: 2,
            fusion_method: FusionMethod::ReciprocalRank,
        }
    }
}

/// BM25 keyword retriever configuration
///
/// The defaults match the Okapi parameterization this retriever was tuned
/// against: `k1 = 1.5`, `b = 0.75`, with negative IDF values floored to
/// `epsilon * average_idf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    /// Term frequency saturation
    pub k1: f32,
    /// Document length normalization strength
    pub b: f32,
    /// Floor factor for negative IDF values
    pub epsilon: f32,
    /// Cosmetic label used in logs
    pub collection_name: String,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
            collection_name: "default".to_string(),
        }
    }
}

/// Vector retriever configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Cosmetic label used in logs
    pub collection_name: String,
    /// Minimum token length kept by the fallback TF-IDF vectorizer
    pub min_token_len: usize,
    /// Minimum cosine similarity for vector retrieval results
    pub threshold: f32,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            collection_name: "default".to_string(),
            min_token_len: crate::vectorizer::DEFAULT_MIN_TOKEN_LEN,
            threshold: 0.0,
        }
    }
}
