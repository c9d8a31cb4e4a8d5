//! The corpus service: load once per process, persist across processes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::analysis::{LexiconPosTagger, PosTagger, TextAnalyzer};
use crate::config::{CorpusConfig, SentivoteConfig};
use crate::corpus::builder::{Corpus, CorpusBuilder, CorpusPayload};
use crate::error::Result;
use crate::storage::{ArtifactKind, read_artifact, write_artifact};

/// Lazily loaded, process-wide corpus.
///
/// The first call to [`load_corpus`](CorpusStore::load_corpus) reads the
/// corpus artifact (or parses the sources and writes the artifact); every
/// later call returns the same `Arc`. The load runs under the lock, so
/// concurrent first callers wait for a single load instead of racing.
pub struct CorpusStore {
    config: CorpusConfig,
    artifact_path: PathBuf,
    analyzer: TextAnalyzer,
    tagger: Arc<dyn PosTagger>,
    loaded: Mutex<Option<Arc<Corpus>>>,
    builds: AtomicUsize,
}

impl std::fmt::Debug for CorpusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusStore")
            .field("artifact_path", &self.artifact_path)
            .field("tagger", &self.tagger.name())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl CorpusStore {
    /// Create a store for the given sources and artifact location.
    pub fn new<P: Into<PathBuf>>(config: CorpusConfig, artifact_path: P) -> Self {
        CorpusStore {
            config,
            artifact_path: artifact_path.into(),
            analyzer: TextAnalyzer::new(),
            tagger: Arc::new(LexiconPosTagger::new()),
            loaded: Mutex::new(None),
            builds: AtomicUsize::new(0),
        }
    }

    /// Create a store from the top-level configuration.
    pub fn from_config(config: &SentivoteConfig) -> Self {
        Self::new(config.corpus.clone(), config.corpus_artifact_path())
    }

    /// Use a different part-of-speech tagger for vocabulary filtering.
    pub fn with_tagger(mut self, tagger: Arc<dyn PosTagger>) -> Self {
        self.tagger = tagger;
        self
    }

    /// Use a different analyzer. Feature extraction must use the same one.
    pub fn with_analyzer(mut self, analyzer: TextAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn analyzer(&self) -> &TextAnalyzer {
        &self.analyzer
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Return the corpus, loading or building it on first access.
    pub fn load_corpus(&self) -> Result<Arc<Corpus>> {
        let mut loaded = self.loaded.lock();
        if let Some(corpus) = loaded.as_ref() {
            debug!("Returning cached corpus");
            return Ok(corpus.clone());
        }

        let corpus = Arc::new(self.load_or_build()?);
        *loaded = Some(corpus.clone());
        Ok(corpus)
    }

    /// Drop the in-memory corpus; the next access reloads the artifact.
    pub fn release(&self) {
        if self.loaded.lock().take().is_some() {
            debug!("Released in-memory corpus");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().is_some()
    }

    /// How many times the corpus was parsed from its sources.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Key of the corpus artifact: the corpus settings plus the analyzer and
    /// tagger that shape the vocabulary.
    fn artifact_key(&self) -> Result<u64> {
        self.config
            .settings_digest_with(&[self.analyzer.tokenizer_name(), self.tagger.name()])
    }

    fn load_or_build(&self) -> Result<Corpus> {
        let digest = self.artifact_key()?;

        match read_artifact::<CorpusPayload>(&self.artifact_path, ArtifactKind::Corpus) {
            Ok(Some((header, payload))) if header.fingerprint == digest => {
                let corpus = Corpus::from(payload);
                info!(
                    "Loaded corpus from {} ({} documents)",
                    self.artifact_path.display(),
                    corpus.len()
                );
                return Ok(corpus);
            }
            Ok(Some(_)) => warn!(
                "Corpus artifact {} was built with different settings or tagger; rebuilding",
                self.artifact_path.display()
            ),
            Ok(None) => info!("Loading corpus from scratch..."),
            Err(e) => warn!("Ignoring unusable corpus artifact: {e}"),
        }

        let start = Instant::now();
        let builder = CorpusBuilder::new(&self.config, &self.analyzer, self.tagger.as_ref());
        let corpus = builder.build()?;
        self.builds.fetch_add(1, Ordering::SeqCst);

        match write_artifact(
            &self.artifact_path,
            ArtifactKind::Corpus,
            digest,
            &corpus.to_payload(),
        ) {
            Ok(()) => debug!("Wrote corpus artifact {}", self.artifact_path.display()),
            Err(e) => warn!("Failed to persist corpus artifact: {e}"),
        }

        info!(
            "Corpus loading complete in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        Ok(corpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PosTag;
    use crate::error::SentivoteError;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    fn write_sources(dir: &Path) -> CorpusConfig {
        let pos = dir.join("positive.txt");
        let neg = dir.join("negative.txt");
        fs::write(&pos, "a wonderfully moving story\nsimply brilliant\n").unwrap();
        fs::write(&neg, "painfully boring\nutterly awful acting\n").unwrap();

        let mut config = CorpusConfig::empty();
        config.positive_path = Some(pos);
        config.negative_path = Some(neg);
        config.test_size = 1;
        config.shuffle_seed = Some(1);
        config
    }

    #[test]
    fn test_second_call_returns_same_corpus() {
        let dir = TempDir::new().unwrap();
        let store = CorpusStore::new(write_sources(dir.path()), dir.path().join("corpus.bin"));

        let first = store.load_corpus().unwrap();
        let second = store.load_corpus().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.build_count(), 1);
    }

    #[test]
    fn test_artifact_survives_restart_without_sources() {
        let dir = TempDir::new().unwrap();
        let config = write_sources(dir.path());
        let artifact = dir.path().join("cache").join("corpus.bin");

        let original = CorpusStore::new(config.clone(), &artifact)
            .load_corpus()
            .unwrap();

        for path in config.source_paths() {
            fs::remove_file(path).unwrap();
        }

        let restarted = CorpusStore::new(config, &artifact);
        let reloaded = restarted.load_corpus().unwrap();
        assert_eq!(restarted.build_count(), 0);
        assert_eq!(reloaded.documents(), original.documents());
        assert_eq!(reloaded.vocabulary(), original.vocabulary());
    }

    #[test]
    fn test_missing_sources_without_artifact_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = CorpusConfig::empty();
        config.positive_path = Some(dir.path().join("missing.txt"));

        let store = CorpusStore::new(config, dir.path().join("corpus.bin"));
        let err = store.load_corpus().unwrap_err();
        assert!(matches!(err, SentivoteError::CorpusUnavailable(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_changed_settings_trigger_rebuild() {
        let dir = TempDir::new().unwrap();
        let config = write_sources(dir.path());
        let artifact = dir.path().join("corpus.bin");
        CorpusStore::new(config.clone(), &artifact).load_corpus().unwrap();

        let mut changed = config;
        changed.pos_filter = None;
        let store = CorpusStore::new(changed, &artifact);
        let corpus = store.load_corpus().unwrap();
        assert_eq!(store.build_count(), 1);
        assert!(corpus.vocabulary().contains("story"));
    }

    struct AllNouns;

    impl PosTagger for AllNouns {
        fn tag(&self, _word: &str) -> PosTag {
            PosTag::NN
        }

        fn name(&self) -> &'static str {
            "all_nouns"
        }
    }

    #[test]
    fn test_swapped_tagger_triggers_rebuild() {
        let dir = TempDir::new().unwrap();
        let config = write_sources(dir.path());
        let artifact = dir.path().join("corpus.bin");
        let original = CorpusStore::new(config.clone(), &artifact)
            .load_corpus()
            .unwrap();
        assert!(!original.vocabulary().is_empty());

        let swapped = CorpusStore::new(config.clone(), &artifact).with_tagger(Arc::new(AllNouns));
        let corpus = swapped.load_corpus().unwrap();
        assert_eq!(swapped.build_count(), 1);
        assert!(corpus.vocabulary().is_empty());

        // The artifact now belongs to the new tagger.
        let again = CorpusStore::new(config, &artifact).with_tagger(Arc::new(AllNouns));
        again.load_corpus().unwrap();
        assert_eq!(again.build_count(), 0);
    }

    #[test]
    fn test_corrupt_artifact_is_rebuilt() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("corpus.bin");
        fs::write(&artifact, b"not an artifact").unwrap();

        let store = CorpusStore::new(write_sources(dir.path()), &artifact);
        let corpus = store.load_corpus().unwrap();
        assert_eq!(corpus.len(), 4);
        assert_eq!(store.build_count(), 1);
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(CorpusStore::new(
            write_sources(dir.path()),
            dir.path().join("corpus.bin"),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.load_corpus().unwrap())
            })
            .collect();
        let corpora: Vec<Arc<Corpus>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(store.build_count(), 1);
        assert!(corpora.iter().all(|c| Arc::ptr_eq(c, &corpora[0])));
    }

    #[test]
    fn test_release_reloads_from_artifact() {
        let dir = TempDir::new().unwrap();
        let store = CorpusStore::new(write_sources(dir.path()), dir.path().join("corpus.bin"));
        let first = store.load_corpus().unwrap();

        store.release();
        assert!(!store.is_loaded());

        let second = store.load_corpus().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.documents(), second.documents());
        assert_eq!(store.build_count(), 1);
    }
}
