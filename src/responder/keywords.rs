//! Keyword extraction
//!
//! Splits text into lowercase word tokens and drops stop words and very
//! short tokens. When nothing survives the filter the raw token list is
//! returned instead, so word-bearing input never produces an empty result.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Common function words ignored during extraction
pub const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "and", "or", "but",
    "in", "with", "to", "for", "of", "as", "by", "this", "that", "it",
];

/// Tokens of this many characters or fewer are never keywords
const MIN_KEYWORD_CHARS: usize = 2;

/// Stateless keyword extractor
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stop_words: HashSet<&'static str>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Lowercased word tokens in text order
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        WORD.find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Ordered keywords; duplicates are kept
    pub fn extract(&self, text: &str) -> Vec<String> {
        let words = self.tokenize(text);
        let keywords: Vec<String> = words
            .iter()
            .filter(|w| self.is_keyword(w))
            .cloned()
            .collect();

        if keywords.is_empty() {
            words
        } else {
            keywords
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        !self.stop_words.contains(word) && word.chars().count() > MIN_KEYWORD_CHARS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_stop_words_and_short_tokens() {
        let extractor = KeywordExtractor::new();
        assert_eq!(extractor.extract("Tell me a joke"), vec!["tell", "joke"]);
        assert_eq!(
            extractor.extract("The weather in Paris is lovely"),
            vec!["weather", "paris", "lovely"]
        );
    }

    #[test]
    fn test_falls_back_to_raw_tokens() {
        let extractor = KeywordExtractor::new();
        assert_eq!(extractor.extract("it is on"), vec!["it", "is", "on"]);
        assert_eq!(extractor.extract("Go!"), vec!["go"]);
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        let extractor = KeywordExtractor::new();
        assert_eq!(
            extractor.extract("rust, Python and rust_lang rust"),
            vec!["rust", "python", "rust_lang", "rust"]
        );
    }

    #[test]
    fn test_empty_input() {
        let extractor = KeywordExtractor::new();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   ?! ").is_empty());
    }

    #[test]
    fn test_length_counts_characters() {
        let extractor = KeywordExtractor::new();
        // "été" is three characters but six bytes
        assert_eq!(extractor.extract("un été"), vec!["été"]);
    }
}
