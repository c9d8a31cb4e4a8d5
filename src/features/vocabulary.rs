//! The vocabulary: the fixed set of words used as feature keys.

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Sorted, deduplicated set of lowercase words.
///
/// Immutable after construction. The sorted order gives every word a stable
/// index (its bit position in a [`FeatureVector`](super::FeatureVector)) and
/// makes the [`fingerprint`](Vocabulary::fingerprint) independent of the order
/// in which words were discovered.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    words: Vec<String>,
    index: AHashMap<String, usize>,
    fingerprint: u64,
}

impl Vocabulary {
    /// Build a vocabulary from any collection of words.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        Self::from(words)
    }

    /// An empty vocabulary.
    pub fn empty() -> Self {
        Self::from(Vec::new())
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the vocabulary has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether the word is part of the vocabulary.
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Bit position of a word.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Word at a bit position.
    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    /// All words in index order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Iterate over the words in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Content hash identifying this exact word set.
    ///
    /// High 32 bits: word count. Low 32 bits: CRC-32 over the sorted words,
    /// each terminated by a newline.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    fn compute_fingerprint(words: &[String]) -> u64 {
        let mut hasher = crc32fast::Hasher::new();
        for word in words {
            hasher.update(word.as_bytes());
            hasher.update(b"\n");
        }
        ((words.len() as u64) << 32) | hasher.finalize() as u64
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(mut words: Vec<String>) -> Self {
        words.sort_unstable();
        words.dedup();

        let index = words
            .iter()
            .enumerate()
            .map(|(i, word)| (word.clone(), i))
            .collect();
        let fingerprint = Self::compute_fingerprint(&words);

        Vocabulary {
            words,
            index,
            fingerprint,
        }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.words
    }
}

impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.words == other.words
    }
}

impl Eq for Vocabulary {}

impl fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vocabulary")
            .field("len", &self.words.len())
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_deduplicated() {
        let vocab = Vocabulary::new(["great", "awful", "great", "boring"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.words(), &["awful", "boring", "great"]);
        assert_eq!(vocab.index_of("boring"), Some(1));
        assert_eq!(vocab.word(2), Some("great"));
        assert!(!vocab.contains("meh"));
    }

    #[test]
    fn test_fingerprint_ignores_discovery_order() {
        let a = Vocabulary::new(["good", "bad", "ugly"]);
        let b = Vocabulary::new(["ugly", "good", "bad"]);
        let c = Vocabulary::new(["good", "bad"]);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint() >> 32, 3);
    }

    #[test]
    fn test_serde_rebuilds_index() {
        let vocab = Vocabulary::new(["loved", "hated"]);
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["hated","loved"]"#);

        let restored: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vocab);
        assert_eq!(restored.index_of("loved"), Some(1));
        assert_eq!(restored.fingerprint(), vocab.fingerprint());
    }

    #[test]
    fn test_empty() {
        let vocab = Vocabulary::empty();
        assert!(vocab.is_empty());
        assert_eq!(vocab.fingerprint() >> 32, 0);
    }
}
