//! Text analyzers.
//!
//! An analyzer turns raw text into the lowercase terms used as vocabulary
//! words. The same analyzer must run at vocabulary-building time and at
//! classification time; any drift between the two silently corrupts every
//! feature vector, which is why the corpus loader and the feature extractor
//! both hold a [`TextAnalyzer`] rather than tokenizing on their own.

use std::sync::Arc;

use crate::analysis::token::TokenStream;
use crate::analysis::tokenizer::{Tokenizer, WordTokenizer};
use crate::analysis::transliterate::transliterate;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// ASCII folding, word tokenization and lowercasing.
#[derive(Clone)]
pub struct TextAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
}

impl std::fmt::Debug for TextAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextAnalyzer")
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextAnalyzer {
    /// Create an analyzer backed by the word tokenizer.
    pub fn new() -> Self {
        Self::with_tokenizer(Arc::new(WordTokenizer::new()))
    }

    /// Create an analyzer with a custom tokenizer.
    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>) -> Self {
        TextAnalyzer { tokenizer }
    }

    /// Name of the underlying tokenizer.
    pub fn tokenizer_name(&self) -> &'static str {
        self.tokenizer.name()
    }

    /// Analyze text into its lowercase terms, in document order.
    pub fn terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }
}

impl Analyzer for TextAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let folded = transliterate(text);
        let tokens = self.tokenizer.tokenize(&folded)?;
        Ok(Box::new(tokens.map(|token| token.lowercase())))
    }

    fn name(&self) -> &'static str {
        "text"
    }
}
