//! Feature extraction: text → boolean presence vector over a vocabulary.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashSet;
use bit_vec::BitVec;

use crate::analysis::TextAnalyzer;
use crate::corpus::{Document, Label};
use crate::error::Result;
use crate::features::vocabulary::Vocabulary;

/// Presence mapping from every vocabulary word to a bool.
///
/// The key set is always exactly the vocabulary; only the values depend on
/// the document.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    vocabulary: Arc<Vocabulary>,
    present: BitVec,
}

impl FeatureVector {
    /// All-false vector over the given vocabulary.
    pub fn absent(vocabulary: Arc<Vocabulary>) -> Self {
        let present = BitVec::from_elem(vocabulary.len(), false);
        FeatureVector {
            vocabulary,
            present,
        }
    }

    /// Build a vector from the bit positions that are present.
    ///
    /// Out-of-range indices are ignored.
    pub fn from_indices<I>(vocabulary: Arc<Vocabulary>, indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut vector = Self::absent(vocabulary);
        for index in indices {
            if index < vector.present.len() {
                vector.present.set(index, true);
            }
        }
        vector
    }

    /// Number of keys (the vocabulary size).
    pub fn len(&self) -> usize {
        self.present.len()
    }

    /// Whether the vector has no keys.
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// The vocabulary this vector is keyed by.
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// Value for a word, `None` when the word is not a key.
    pub fn get(&self, word: &str) -> Option<bool> {
        self.vocabulary
            .index_of(word)
            .and_then(|index| self.present.get(index))
    }

    /// Value at a bit position.
    pub fn is_present(&self, index: usize) -> bool {
        self.present.get(index).unwrap_or(false)
    }

    /// Bit positions whose word occurs in the document, ascending.
    pub fn active_indices(&self) -> Vec<usize> {
        self.present
            .iter()
            .enumerate()
            .filter_map(|(i, present)| present.then_some(i))
            .collect()
    }

    /// Number of words present.
    pub fn count_present(&self) -> usize {
        self.present.iter().filter(|present| *present).count()
    }

    /// Iterate `(word, present)` pairs in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.vocabulary.iter().zip(self.present.iter())
    }

    /// Iterate the keys in vocabulary order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.iter()
    }

    /// Materialize the mapping.
    pub fn to_map(&self) -> BTreeMap<String, bool> {
        self.iter()
            .map(|(word, present)| (word.to_string(), present))
            .collect()
    }
}

impl PartialEq for FeatureVector {
    fn eq(&self, other: &Self) -> bool {
        self.vocabulary.fingerprint() == other.vocabulary.fingerprint()
            && self.present == other.present
    }
}

impl Eq for FeatureVector {}

/// A feature vector with its gold label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledExample {
    pub features: FeatureVector,
    pub label: Label,
}

/// Converts text into feature vectors over one vocabulary.
///
/// Owns the analyzer so training-time and inference-time extraction cannot
/// diverge.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    analyzer: TextAnalyzer,
    vocabulary: Arc<Vocabulary>,
}

impl FeatureExtractor {
    /// Create an extractor with the default analyzer.
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self::with_analyzer(vocabulary, TextAnalyzer::new())
    }

    /// Create an extractor with a specific analyzer.
    pub fn with_analyzer(vocabulary: Arc<Vocabulary>, analyzer: TextAnalyzer) -> Self {
        FeatureExtractor {
            analyzer,
            vocabulary,
        }
    }

    /// The vocabulary used as keys.
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn analyzer(&self) -> &TextAnalyzer {
        &self.analyzer
    }

    /// Extract the presence vector for one text.
    pub fn extract(&self, text: &str) -> Result<FeatureVector> {
        if self.vocabulary.is_empty() {
            return Ok(FeatureVector::absent(self.vocabulary.clone()));
        }

        let terms: AHashSet<String> = self.analyzer.terms(text)?.into_iter().collect();
        let indices = terms
            .iter()
            .filter_map(|term| self.vocabulary.index_of(term));
        Ok(FeatureVector::from_indices(self.vocabulary.clone(), indices))
    }

    /// Extract a labeled example from a document.
    pub fn extract_example(&self, document: &Document) -> Result<LabeledExample> {
        Ok(LabeledExample {
            features: self.extract(&document.text)?,
            label: document.label,
        })
    }

    /// Extract labeled examples for a batch of documents.
    pub fn extract_examples(&self, documents: &[Document]) -> Result<Vec<LabeledExample>> {
        documents
            .iter()
            .map(|document| self.extract_example(document))
            .collect()
    }
}

/// Extract a feature vector with the default analyzer.
pub fn extract(document: &str, vocabulary: &Arc<Vocabulary>) -> Result<FeatureVector> {
    FeatureExtractor::new(vocabulary.clone()).extract(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Arc<Vocabulary> {
        Arc::new(Vocabulary::new(["amazing", "boring", "loved", "wasted"]))
    }

    #[test]
    fn test_presence() {
        let features = extract("I LOVED it, simply Amazing!", &vocab()).unwrap();
        assert_eq!(features.get("loved"), Some(true));
        assert_eq!(features.get("amazing"), Some(true));
        assert_eq!(features.get("boring"), Some(false));
        assert_eq!(features.get("it"), None);
        assert_eq!(features.count_present(), 2);
        assert_eq!(features.active_indices(), vec![0, 2]);
    }

    #[test]
    fn test_key_set_equals_vocabulary() {
        let vocabulary = vocab();
        for text in ["", "nothing relevant", "boring boring boring", "¿qué?"] {
            let features = extract(text, &vocabulary).unwrap();
            let keys: Vec<&str> = features.keys().collect();
            assert_eq!(keys, vocabulary.iter().collect::<Vec<_>>());
            assert_eq!(features.to_map().len(), vocabulary.len());
        }
    }

    #[test]
    fn test_empty_vocabulary() {
        let features = extract("great movie", &Arc::new(Vocabulary::empty())).unwrap();
        assert!(features.is_empty());
        assert!(features.to_map().is_empty());
        assert!(features.active_indices().is_empty());
    }

    #[test]
    fn test_extraction_is_pure() {
        let extractor = FeatureExtractor::new(vocab());
        let a = extractor.extract("wasted two hours, boring").unwrap();
        let b = extractor.extract("wasted two hours, boring").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extract_example_keeps_label() {
        let extractor = FeatureExtractor::new(vocab());
        let document = Document::new("loved it", Label::Pos);
        let example = extractor.extract_example(&document).unwrap();
        assert_eq!(example.label, Label::Pos);
        assert_eq!(example.features.get("loved"), Some(true));
    }
}
