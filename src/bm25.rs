//! BM25 keyword retrieval
//!
//! Scores queries against a tokenized corpus with the Okapi BM25 formula.
//! Statistics are computed in-crate from the document snapshot handed to
//! `process`; there is no external index engine and nothing touches disk.

use crate::config::Bm25Config;
use crate::retriever::{ProcessOptions, QueryOptions, Retriever};
use crate::tokenize::Tokenizer;
use crate::types::{Document, ScoredDocument};
use anyhow::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

/// Retriever using Okapi BM25 over tokenized document text
///
/// `process` builds the corpus statistics; `query` scores every indexed
/// document against the query tokens, discards non-positive scores, and
/// returns the top results. Score ties preserve corpus order.
pub struct Bm25Retriever {
    tokenizer: Tokenizer,
    collection_name: String,
    params: Bm25Config,
    index: RwLock<Option<Bm25Index>>,
}

/// Corpus statistics for one index generation
///
/// Replaced wholesale by every `process` call; never updated in place.
struct Bm25Index {
    /// Original documents, aligned by corpus position
    documents: Vec<Document>,
    /// Term frequency per document
    term_freqs: Vec<HashMap<String, f32>>,
    /// Inverse document frequency per term, with negative values floored
    idf: HashMap<String, f32>,
    /// Token count per document
    doc_len: Vec<f32>,
    /// Average document length across the corpus
    avgdl: f32,
}

impl Bm25Index {
    fn build(documents: &[Document], text_field: &str, tokenizer: &Tokenizer, params: &Bm25Config) -> Self {
        let corpus: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| tokenizer.tokenize(doc.text(text_field)))
            .collect();

        let doc_len: Vec<f32> = corpus.iter().map(|tokens| tokens.len() as f32).collect();
        let total_len: f32 = doc_len.iter().sum();
        let avgdl = if corpus.is_empty() {
            0.0
        } else {
            total_len / corpus.len() as f32
        };

        let mut term_freqs: Vec<HashMap<String, f32>> = Vec::with_capacity(corpus.len());
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for tokens in &corpus {
            let mut freqs: HashMap<String, f32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token.clone()).or_default() += 1.0;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
            term_freqs.push(freqs);
        }

        let idf = Self::compute_idf(&doc_freq, corpus.len(), params.epsilon);

        Self {
            documents: documents.to_vec(),
            term_freqs,
            idf,
            doc_len,
            avgdl,
        }
    }

    /// Okapi IDF: `ln((N - df + 0.5) / (df + 0.5))`, with negative values
    /// (terms in more than half the corpus) floored to `epsilon * average_idf`
    fn compute_idf(doc_freq: &HashMap<String, usize>, corpus_size: usize, epsilon: f32) -> HashMap<String, f32> {
        let n = corpus_size as f32;
        let mut idf: HashMap<String, f32> = HashMap::with_capacity(doc_freq.len());
        let mut idf_sum = 0.0;
        let mut negative: Vec<&String> = Vec::new();

        for (term, &df) in doc_freq {
            let value = ((n - df as f32 + 0.5) / (df as f32 + 0.5)).ln();
            idf_sum += value;
            idf.insert(term.clone(), value);
            if value < 0.0 {
                negative.push(term);
            }
        }

        if !negative.is_empty() {
            let average_idf = idf_sum / idf.len() as f32;
            let floor = epsilon * average_idf;
            for term in negative {
                idf.insert(term.clone(), floor);
            }
        }

        idf
    }

    /// BM25 score of one document against the query tokens
    fn score(&self, query_tokens: &[String], doc_idx: usize, params: &Bm25Config) -> f32 {
        let freqs = &self.term_freqs[doc_idx];
        let length_norm = 1.0 - params.b + params.b * self.doc_len[doc_idx] / self.avgdl;

        query_tokens
            .iter()
            .filter_map(|token| {
                let tf = *freqs.get(token)?;
                let idf = *self.idf.get(token)?;
                Some(idf * (tf * (params.k1 + 1.0)) / (tf + params.k1 * length_norm))
            })
            .sum()
    }
}

impl Bm25Retriever {
    /// Create a retriever with the default tokenizer and parameters
    pub fn new() -> Self {
        Self::with_config(Bm25Config::default())
    }

    /// Create a retriever from configuration
    pub fn with_config(params: Bm25Config) -> Self {
        Self {
            tokenizer: Tokenizer::default(),
            collection_name: params.collection_name.clone(),
            params,
            index: RwLock::new(None),
        }
    }

    /// Replace the default tokenizer
    ///
    /// The same tokenizer is applied to documents and queries, so it must be
    /// set before `process`.
    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }
}

impl Default for Bm25Retriever {
    fn default() -> Self {
        Self::new()
    }
}

impl Retriever for Bm25Retriever {
    fn name(&self) -> &str {
        "bm25"
    }

    fn process(&self, documents: &[Document], options: &ProcessOptions) -> Result<()> {
        let index = Bm25Index::build(documents, &options.text_field, &self.tokenizer, &self.params);

        info!(
            collection = %self.collection_name,
            documents = index.documents.len(),
            terms = index.idf.len(),
            "Built BM25 index"
        );

        *self.index.write() = Some(index);
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

        let query_tokens = self.tokenizer.tokenize(query);
        if query_tokens.is_empty() {
            // Every BM25 score would be zero
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = (0..index.documents.len())
            .map(|i| (i, index.score(&query_tokens, i, &self.params)))
            .collect();

        // Stable sort: ties keep corpus order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let results: Vec<ScoredDocument> = scored
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .take(options.top_k)
            .map(|(i, score)| ScoredDocument::new(index.documents[i].clone(), score))
            .collect();

        debug!("BM25 query '{}': {} results", query, results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("cats and dogs").with_id("d1"),
            Document::new("dogs are loyal").with_id("d2"),
            Document::new("stock market report").with_id("d3"),
        ]
    }

    fn build_retriever(documents: &[Document]) -> Bm25Retriever {
        let retriever = Bm25Retriever::new();
        retriever
            .process(documents, &ProcessOptions::default())
            .unwrap();
        retriever
    }

    #[test]
    fn test_query_before_process_is_empty() {
        let retriever = Bm25Retriever::new();
        let results = retriever
            .query("dogs", &QueryOptions::default())
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_query_matches_term_density() {
        let retriever = build_retriever(&corpus());
        let results = retriever
            .query("dogs", &QueryOptions::default().with_top_k(2))
            .unwrap();

        // Both dog documents score identically here (same tf, same length),
        // so the tie resolves to corpus order: d1 then d2. The stock report
        // never appears.
        assert_eq!(results.len(), 2);
        let ids: Vec<&str> = results.iter().filter_map(|r| r.document.id()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);
        assert!(results.iter().all(|r| r.score > 0.0));
        assert!((results[0].score - results[1].score).abs() < 1e-6);
    }

    #[test]
    fn test_scores_non_increasing_and_bounded_by_top_k() {
        let docs = vec![
            Document::new("rust is a systems programming language").with_id("a"),
            Document::new("rust rust rust everywhere").with_id("b"),
            Document::new("python is a scripting language").with_id("c"),
            Document::new("the rust borrow checker").with_id("d"),
        ];
        let retriever = build_retriever(&docs);
        let results = retriever
            .query("rust language", &QueryOptions::default().with_top_k(3))
            .unwrap();

        assert!(results.len() <= 3);
        assert!(results.iter().all(|r| r.score > 0.0));
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_shorter_document_ranks_higher_on_equal_tf() {
        // One "dogs" in 3 tokens beats one "dogs" in 7: length normalization
        let docs = vec![
            Document::new("dogs and cats and birds and fish").with_id("long"),
            Document::new("dogs are loyal").with_id("short"),
            Document::new("stock market report").with_id("noise"),
        ];
        let retriever = build_retriever(&docs);
        let results = retriever
            .query("dogs", &QueryOptions::default().with_top_k(2))
            .unwrap();

        let ids: Vec<&str> = results.iter().filter_map(|r| r.document.id()).collect();
        assert_eq!(ids, vec!["short", "long"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_non_matching_documents_dropped() {
        let retriever = build_retriever(&corpus());
        let results = retriever
            .query("dogs", &QueryOptions::default().with_top_k(10))
            .unwrap();
        assert!(results.iter().all(|r| r.document.id() != Some("d3")));
    }

    #[test]
    fn test_empty_query_tokens_is_empty() {
        let retriever = build_retriever(&corpus());
        let results = retriever
            .query("!!! ...", &QueryOptions::default())
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_top_k_zero_is_empty() {
        let retriever = build_retriever(&corpus());
        let results = retriever
            .query("dogs", &QueryOptions::default().with_top_k(0))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_process_replaces_prior_index() {
        let retriever = build_retriever(&corpus());

        let replacement = vec![
            Document::new("fresh start").with_id("n1"),
            Document::new("second entry").with_id("n2"),
            Document::new("third entry").with_id("n3"),
        ];
        retriever
            .process(&replacement, &ProcessOptions::default())
            .unwrap();

        // Old corpus is gone entirely
        let old = retriever.query("dogs", &QueryOptions::default()).unwrap();
        assert!(old.is_empty());
        let new = retriever.query("fresh", &QueryOptions::default()).unwrap();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].document.id(), Some("n1"));
    }

    #[test]
    fn test_process_is_idempotent() {
        let retriever = build_retriever(&corpus());
        let first = retriever.query("dogs", &QueryOptions::default()).unwrap();

        retriever
            .process(&corpus(), &ProcessOptions::default())
            .unwrap();
        let second = retriever.query("dogs", &QueryOptions::default()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_document_tolerated_as_empty_text() {
        let docs = vec![
            Document::new("dogs bark").with_id("ok"),
            Document::default().with_id("no-text").with_field("title", "orphan"),
            Document::new("cats purr").with_id("other"),
        ];
        let retriever = build_retriever(&docs);
        let results = retriever.query("dogs", &QueryOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id(), Some("ok"));
    }

    #[test]
    fn test_custom_tokenizer_applies_to_corpus_and_query() {
        // Tokenizer that keeps only the first character of each word
        let tokenizer = Tokenizer::new(|text| {
            text.split_whitespace()
                .filter_map(|w| w.chars().next())
                .map(|c| c.to_lowercase().to_string())
                .collect()
        });
        let retriever = Bm25Retriever::new().with_tokenizer(tokenizer);
        retriever
            .process(
                &[
                    Document::new("zebra quilt").with_id("z"),
                    Document::new("mango").with_id("m"),
                    Document::new("apple").with_id("a"),
                ],
                &ProcessOptions::default(),
            )
            .unwrap();

        let results = retriever
            .query("zoo", &QueryOptions::default())
            .unwrap();
        assert_eq!(results.len(), 1, "both sides tokenize to first letters");
        assert_eq!(results[0].document.id(), Some("z"));
    }
}
