//! Configuration for corpus loading, training and classification.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! {
//!   "corpus": { "positive_path": "data/positive.txt", "test_size": 250 },
//!   "confidence_threshold": 0.8,
//!   "algorithms": ["multinomial_nb", "bernoulli_nb", "linear_svc"]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::PosTag;
use crate::classifier::AlgorithmId;
use crate::error::{Result, SentivoteError};

/// Default minimum vote fraction for a classification to be reported.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentivoteConfig {
    /// Training corpus sources and vocabulary policy.
    pub corpus: CorpusConfig,

    /// Directory holding the corpus and model artifacts.
    pub cache_dir: PathBuf,

    /// Classifications with a lower vote fraction are reported as unsure.
    pub confidence_threshold: f64,

    /// Algorithms voting in the ensemble, in tie-break order.
    pub algorithms: Vec<AlgorithmId>,

    /// Seed for stochastic training algorithms.
    pub training_seed: u64,

    /// Train independent algorithms concurrently.
    pub parallel_training: bool,

    /// Worker threads for parallel training.
    /// If None, uses the number of CPU cores.
    pub training_threads: Option<usize>,

    /// Accept an ensemble missing the algorithms that failed to train.
    pub allow_partial_ensemble: bool,

    /// Number of most recent inbound texts kept when classification falls behind.
    pub buffer_capacity: usize,

    /// Drop reshared texts (`RT @user ...`) before classification.
    pub skip_reshares: bool,
}

impl Default for SentivoteConfig {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig::default(),
            cache_dir: PathBuf::from("cache"),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            algorithms: AlgorithmId::ALL.to_vec(),
            training_seed: 42,
            parallel_training: false,
            training_threads: None,
            allow_partial_ensemble: false,
            buffer_capacity: 20,
            skip_reshares: true,
        }
    }
}

impl SentivoteConfig {
    /// Load and validate a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SentivoteConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        if !self.confidence_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.confidence_threshold)
        {
            return Err(SentivoteError::configuration(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }

        if self.algorithms.is_empty() {
            return Err(SentivoteError::configuration(
                "at least one algorithm must be configured",
            ));
        }

        let mut seen = HashSet::new();
        for algorithm in &self.algorithms {
            if !seen.insert(algorithm) {
                return Err(SentivoteError::configuration(format!(
                    "algorithm listed twice: {algorithm}"
                )));
            }
        }

        if self.training_threads == Some(0) {
            return Err(SentivoteError::configuration(
                "training_threads must be positive",
            ));
        }

        if self.buffer_capacity == 0 {
            return Err(SentivoteError::configuration(
                "buffer_capacity must be positive",
            ));
        }

        self.corpus.validate()
    }

    /// Worker threads to use when training in parallel.
    pub fn effective_training_threads(&self) -> usize {
        self.training_threads.unwrap_or_else(num_cpus::get)
    }

    /// Location of the corpus artifact.
    pub fn corpus_artifact_path(&self) -> PathBuf {
        self.cache_dir.join("corpus.bin")
    }

    /// Directory of the per-algorithm model artifacts.
    pub fn model_dir(&self) -> PathBuf {
        self.cache_dir.join("models")
    }
}

/// Corpus sources, split and vocabulary policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Line file of positive items.
    pub positive_path: Option<PathBuf>,

    /// Line file of negative items.
    pub negative_path: Option<PathBuf>,

    /// Delimited record file with text and sentiment columns.
    pub records: Option<RecordSourceConfig>,

    /// Number of shuffled documents held out for evaluation.
    pub test_size: usize,

    /// Seed for the shuffle before splitting. Random when absent.
    pub shuffle_seed: Option<u64>,

    /// Part-of-speech allow-list for vocabulary words. `null` keeps every word.
    pub pos_filter: Option<Vec<PosTag>>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            positive_path: Some(PathBuf::from("positive.txt")),
            negative_path: Some(PathBuf::from("negative.txt")),
            records: None,
            test_size: 100,
            shuffle_seed: None,
            pos_filter: Some(PosTag::default_allow_list()),
        }
    }
}

impl CorpusConfig {
    /// A config with no sources, for building up programmatically.
    pub fn empty() -> Self {
        Self {
            positive_path: None,
            negative_path: None,
            records: None,
            ..Default::default()
        }
    }

    /// Whether any source is configured.
    pub fn has_sources(&self) -> bool {
        self.positive_path.is_some() || self.negative_path.is_some() || self.records.is_some()
    }

    /// Every configured source path.
    pub fn source_paths(&self) -> Vec<&Path> {
        let mut paths = Vec::new();
        if let Some(path) = &self.positive_path {
            paths.push(path.as_path());
        }
        if let Some(path) = &self.negative_path {
            paths.push(path.as_path());
        }
        if let Some(records) = &self.records {
            paths.push(records.path.as_path());
        }
        paths
    }

    /// Digest of every setting that shapes the parsed corpus.
    ///
    /// Stored in the corpus artifact; a different digest means the artifact
    /// was built from other sources or another policy.
    pub fn settings_digest(&self) -> Result<u64> {
        self.settings_digest_with(&[])
    }

    /// Like [`settings_digest`](Self::settings_digest), also covering the
    /// names of the components (analyzer, tagger) that shape the vocabulary.
    pub fn settings_digest_with(&self, components: &[&str]) -> Result<u64> {
        let mut encoded = serde_json::to_vec(self)?;
        for component in components {
            encoded.push(0);
            encoded.extend_from_slice(component.as_bytes());
        }
        Ok(((encoded.len() as u64) << 32) | crc32fast::hash(&encoded) as u64)
    }

    fn validate(&self) -> Result<()> {
        if let Some(records) = &self.records {
            if records.text_column == records.label_column {
                return Err(SentivoteError::configuration(
                    "records.text_column and records.label_column must differ",
                ));
            }
            if !records.delimiter.is_ascii() {
                return Err(SentivoteError::configuration(
                    "records.delimiter must be an ASCII character",
                ));
            }
        }
        Ok(())
    }
}

/// A delimited record file (e.g. a tweet corpus export).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSourceConfig {
    pub path: PathBuf,

    /// Zero-based column holding the text.
    #[serde(default = "default_text_column")]
    pub text_column: usize,

    /// Zero-based column holding the sentiment code.
    #[serde(default = "default_label_column")]
    pub label_column: usize,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default)]
    pub has_headers: bool,
}

impl RecordSourceConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            text_column: default_text_column(),
            label_column: default_label_column(),
            delimiter: default_delimiter(),
            has_headers: false,
        }
    }
}

fn default_text_column() -> usize {
    4
}

fn default_label_column() -> usize {
    1
}

fn default_delimiter() -> char {
    ','
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SentivoteConfig::default();
        config.validate().unwrap();
        assert_eq!(config.confidence_threshold, 0.7);
        assert_eq!(config.algorithms.len(), 7);
        assert_eq!(config.corpus_artifact_path(), PathBuf::from("cache/corpus.bin"));
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "corpus": { "test_size": 10, "pos_filter": null },
            "confidence_threshold": 0.8,
            "algorithms": ["bernoulli_nb", "linear_svc"]
        }"#;
        let config: SentivoteConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.corpus.test_size, 10);
        assert_eq!(config.corpus.pos_filter, None);
        assert_eq!(
            config.corpus.positive_path,
            Some(PathBuf::from("positive.txt"))
        );
        assert_eq!(
            config.algorithms,
            vec![AlgorithmId::BernoulliNb, AlgorithmId::LinearSvc]
        );
        assert_eq!(config.buffer_capacity, 20);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = SentivoteConfig::default();
        config.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = SentivoteConfig::default();
        config.algorithms = vec![AlgorithmId::LinearSvc, AlgorithmId::LinearSvc];
        assert!(config.validate().is_err());

        let mut config = SentivoteConfig::default();
        config.algorithms.clear();
        assert!(config.validate().is_err());

        let mut config = SentivoteConfig::default();
        config.training_threads = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_record_defaults() {
        let json = r#"{ "path": "full-corpus.csv" }"#;
        let records: RecordSourceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(records, RecordSourceConfig::new("full-corpus.csv"));
        assert_eq!(records.text_column, 4);
        assert_eq!(records.label_column, 1);
    }

    #[test]
    fn test_settings_digest_tracks_changes() {
        let a = CorpusConfig::default();
        let mut b = CorpusConfig::default();
        assert_eq!(a.settings_digest().unwrap(), b.settings_digest().unwrap());

        b.test_size = 50;
        assert_ne!(a.settings_digest().unwrap(), b.settings_digest().unwrap());
    }

    #[test]
    fn test_settings_digest_covers_components() {
        let config = CorpusConfig::default();
        let plain = config.settings_digest().unwrap();
        let lexicon = config.settings_digest_with(&["word", "lexicon"]).unwrap();
        let other = config.settings_digest_with(&["word", "all_nouns"]).unwrap();

        assert_ne!(plain, lexicon);
        assert_ne!(lexicon, other);
        assert_eq!(lexicon, config.settings_digest_with(&["word", "lexicon"]).unwrap());
    }
}
