//! Token types for text analysis.
//!
//! A [`Token`] is the unit that flows from the tokenizer into vocabulary
//! building and feature extraction.
//!
//! ```
//! use sentivote::analysis::token::Token;
//!
//! let token = Token::with_offsets("world", 1, 6, 11);
//! assert_eq!(token.text, "world");
//! assert_eq!(token.start_offset, 6);
//! assert_eq!(token.end_offset, 11);
//! ```

/// A single unit of text after tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token's text content.
    pub text: String,
    /// Position in the token stream (0-based).
    pub position: usize,
    /// Byte offset of the first character in the source text.
    pub start_offset: usize,
    /// Byte offset one past the last character in the source text.
    pub end_offset: usize,
}

impl Token {
    /// Create a token without offset information.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        let text = text.into();
        let end_offset = text.len();
        Token {
            text,
            position,
            start_offset: 0,
            end_offset,
        }
    }

    /// Create a token with explicit byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }

    /// Lowercase the token text in place.
    pub fn lowercase(mut self) -> Self {
        self.text = self.text.to_lowercase();
        self
    }
}

/// A stream of tokens produced by a tokenizer.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;
