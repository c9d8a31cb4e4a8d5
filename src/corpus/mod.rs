//! Corpus loading.
//!
//! Raw labeled sources are parsed into a [`Corpus`]: shuffled [`Document`]s,
//! the [`Vocabulary`](crate::features::Vocabulary) derived from them, and a
//! held-out test partition. [`CorpusStore`] caches the result in memory and
//! on disk so parsing happens once.

pub mod builder;
pub mod document;
pub mod reader;
pub mod store;

pub use builder::{Corpus, CorpusBuilder, build_vocabulary};
pub use document::{Document, Label};
pub use store::CorpusStore;
