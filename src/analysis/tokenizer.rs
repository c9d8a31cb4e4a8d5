//! Word tokenization.
//!
//! [`WordTokenizer`] splits text using Unicode word boundary rules (UAX #29)
//! and drops the punctuation and whitespace segments.
//!
//! ```
//! use sentivote::analysis::tokenizer::{Tokenizer, WordTokenizer};
//!
//! let tokenizer = WordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello, world!").unwrap().collect();
//! assert_eq!(tokens[0].text, "Hello");
//! assert_eq!(tokens[1].text, "world");
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so a tokenizer can be shared by the
/// corpus loader and the pipeline worker.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer for debugging and logging.
    fn name(&self) -> &'static str;
}

/// A tokenizer that splits text on Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    /// Create a new word tokenizer.
    pub fn new() -> Self {
        WordTokenizer
    }

    fn is_word(segment: &str) -> bool {
        segment.chars().any(|c| c.is_alphanumeric())
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .split_word_bound_indices()
            .filter(|(_, segment)| Self::is_word(segment))
            .enumerate()
            .map(|(position, (start, segment))| {
                Token::with_offsets(segment, position, start, start + segment.len())
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        WordTokenizer::new()
            .tokenize(input)
            .unwrap()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_punctuation_is_dropped() {
        assert_eq!(
            texts("What a movie... loved it!!"),
            vec!["What", "a", "movie", "loved", "it"]
        );
    }

    #[test]
    fn test_contractions_stay_whole() {
        assert_eq!(texts("don't stop"), vec!["don't", "stop"]);
    }

    #[test]
    fn test_offsets_and_positions() {
        let tokens: Vec<Token> = WordTokenizer::new()
            .tokenize("so  good")
            .unwrap()
            .collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].position, 1);
        assert_eq!(tokens[1].start_offset, 4);
        assert_eq!(tokens[1].end_offset, 8);
    }

    #[test]
    fn test_empty_input() {
        assert!(texts("").is_empty());
        assert!(texts("  ?! ").is_empty());
    }
}
