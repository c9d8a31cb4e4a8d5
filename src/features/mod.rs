//! Vocabulary and feature extraction.
//!
//! A [`Vocabulary`] is derived once from the training corpus; a
//! [`FeatureExtractor`] turns any text into a [`FeatureVector`] keyed by that
//! vocabulary.

pub mod extractor;
pub mod vocabulary;

pub use extractor::{FeatureExtractor, FeatureVector, LabeledExample, extract};
pub use vocabulary::Vocabulary;
