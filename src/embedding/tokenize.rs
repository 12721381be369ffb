//! Tokenization for the term-weight embedder.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Word tokens of two or more characters.
static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap_or_else(|_| unreachable!()));

/// Common English words that carry no topical signal.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "etc", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into", "is",
    "it", "its", "itself", "just", "may", "me", "might", "more", "most", "must", "my", "myself",
    "no", "nor", "not", "now", "of", "off", "on", "once", "one", "only", "or", "other", "our",
    "ours", "ourselves", "out", "over", "own", "same", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
    "they", "this", "those", "through", "thus", "to", "too", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "were", "what", "when", "where", "whether", "which",
    "while", "who", "whom", "why", "will", "with", "within", "without", "would", "yet", "you",
    "your", "yours", "yourself", "yourselves",
];

static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Returns true if `word` (already lowercased) is an English stop word.
#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Splits text into lowercase word tokens.
///
/// Tokens shorter than two characters are dropped, and so are stop words
/// when `remove_stop_words` is set.
#[must_use]
pub fn tokenize(text: &str, remove_stop_words: bool) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !remove_stop_words || !is_stop_word(token))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Transformer Attention", &["transformer", "attention"]; "lowercases")]
    #[test_case("the attention of a model", &["attention", "model"]; "drops stop words")]
    #[test_case("x-ray, self-attention!", &["ray", "self", "attention"]; "splits punctuation")]
    #[test_case("GPT-4 and BERT", &["gpt", "bert"]; "drops single chars")]
    #[test_case("   ", &[]; "blank")]
    fn test_tokenize(input: &str, expected: &[&str]) {
        assert_eq!(tokenize(input, true), expected);
    }

    #[test]
    fn test_tokenize_keeps_stop_words_when_disabled() {
        assert_eq!(tokenize("the model", false), vec!["the", "model"]);
    }

    #[test]
    fn test_tokenize_unicode() {
        assert_eq!(tokenize("Über Modelle", true), vec!["über", "modelle"]);
    }

    #[test]
    fn test_stop_word_lookup() {
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("attention"));
    }
}
