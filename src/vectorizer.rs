//! Bag-of-words TF-IDF vectorization
//!
//! Fallback embedding path for the vector retriever when no external embedder
//! is supplied: `fit` learns a vocabulary and IDF weights from the corpus,
//! `transform` maps any text into that fixed vector space. A fitted
//! vectorizer is instance state owned by its retriever, refit (and the old
//! one discarded) on every later `process`.

use crate::types::Embedding;
use std::collections::{BTreeMap, HashMap};
use unicode_segmentation::UnicodeSegmentation;

/// Minimum token length kept by the vectorizer's tokenization
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// A fitted TF-IDF vectorizer
///
/// Vocabulary indices are assigned in sorted term order, so fitting the same
/// corpus twice yields identical vector spaces. IDF uses the smoothed form
/// `ln((1 + n) / (1 + df)) + 1` and transformed vectors are L2-normalized,
/// which makes their dot product a cosine similarity.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    min_token_len: usize,
}

impl TfidfVectorizer {
    /// Fit a vectorizer on a corpus of texts
    pub fn fit<S: AsRef<str>>(texts: &[S], min_token_len: usize) -> Self {
        // BTreeMap gives deterministic, sorted vocabulary assignment
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();

        for text in texts {
            let mut seen: Vec<String> = tokenize(text.as_ref(), min_token_len);
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *doc_freq.entry(term).or_default() += 1;
            }
        }

        let n = texts.len() as f32;
        let mut vocabulary = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());

        for (index, (term, df)) in doc_freq.into_iter().enumerate() {
            vocabulary.insert(term, index);
            idf.push(((1.0 + n) / (1.0 + df as f32)).ln() + 1.0);
        }

        Self {
            vocabulary,
            idf,
            min_token_len,
        }
    }

    /// Map a text into the fitted vector space
    ///
    /// Terms outside the fitted vocabulary contribute nothing. The result is
    /// L2-normalized; an all-zero vector (no known terms) stays all-zero.
    pub fn transform(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.idf.len()];

        for token in tokenize(text, self.min_token_len) {
            if let Some(&index) = self.vocabulary.get(&token) {
                vector[index] += 1.0;
            }
        }

        for (value, idf) in vector.iter_mut().zip(self.idf.iter()) {
            *value *= idf;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in vector.iter_mut() {
                *value /= norm;
            }
        }

        vector
    }

    /// Size of the fitted vector space
    pub fn dimensions(&self) -> usize {
        self.idf.len()
    }
}

fn tokenize(text: &str, min_token_len: usize) -> Vec<String> {
    text.to_lowercase()
        .unicode_words()
        .filter(|w| w.chars().count() >= min_token_len)
        .map(|w| w.to_string())
        .collect()
}
