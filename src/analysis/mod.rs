//! Text analysis: ASCII folding, tokenization and part-of-speech tagging.

pub mod analyzer;
pub mod pos;
pub mod token;
pub mod tokenizer;
pub mod transliterate;

pub use analyzer::{Analyzer, TextAnalyzer};
pub use pos::{LexiconPosTagger, PosTag, PosTagger};
pub use token::{Token, TokenStream};
pub use tokenizer::{Tokenizer, WordTokenizer};
pub use transliterate::{decode_bytes, transliterate};
