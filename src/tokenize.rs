//! Query and document tokenization
//!
//! Retrievers that work on keyword statistics share one tokenizer between
//! `process` and `query` so corpus and query land in the same token space.

use std::fmt;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// A shareable tokenization function
///
/// Wraps a `text -> tokens` closure so custom tokenizers (stemmers, n-gram
/// splitters, CJK segmenters) can be swapped in without changing retriever
/// code. Cloning is cheap.
#[derive(Clone)]
pub struct Tokenizer {
    inner: Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>,
}

impl Tokenizer {
    /// Create a tokenizer from a custom function
    pub fn new(f: impl Fn(&str) -> Vec<String> + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(f) }
    }

    /// Tokenize a piece of text
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        (self.inner)(text)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(default_tokenize)
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tokenizer")
    }
}

/// Default tokenization: lowercase, strip punctuation, split on word bounds
pub fn default_tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .unicode_words()
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tokenize_lowercases_and_strips_punctuation() {
        let tokens = default_tokenize("Dogs are LOYAL, really!");
        assert_eq!(tokens, vec!["dogs", "are", "loyal", "really"]);
    }

    #[test]
    fn test_default_tokenize_empty_input() {
        assert!(default_tokenize("").is_empty());
        assert!(default_tokenize("  ...  !!").is_empty());
    }

    #[test]
    fn test_custom_tokenizer() {
        let tokenizer = Tokenizer::new(|text| {
            text.split(',').map(|s| s.trim().to_string()).collect()
        });
        assert_eq!(tokenizer.tokenize("a, b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tokenizer_clone_shares_function() {
        let tokenizer = Tokenizer::default();
        let clone = tokenizer.clone();
        assert_eq!(tokenizer.tokenize("Cats and dogs"), clone.tokenize("Cats and dogs"));
    }
}
