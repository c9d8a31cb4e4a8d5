//! The model service: train each algorithm at most once, persist the result.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::Mutex;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::classifier::{AlgorithmId, Estimator, TrainedModel, TrainingData};
use crate::config::SentivoteConfig;
use crate::corpus::{Corpus, CorpusStore};
use crate::error::{Result, SentivoteError};
use crate::features::FeatureExtractor;
use crate::storage::{ArtifactKind, read_artifact, write_artifact};
use crate::trainer::report::{ModelSource, TrainingReport};

/// Builds the estimator for an algorithm from the training seed.
pub type EstimatorFactory = Arc<dyn Fn(AlgorithmId, u64) -> Box<dyn Estimator> + Send + Sync>;

/// Trains, persists and memoizes sentiment models.
///
/// A report is memoized per requested algorithm list, so asking twice for
/// the same list returns the same `Arc` without touching the disk. Each model
/// is also written to `<model_dir>/<algorithm>.bin` and reused by later
/// processes as long as the vocabulary is unchanged.
pub struct ModelTrainer {
    corpus: Arc<CorpusStore>,
    model_dir: PathBuf,
    seed: u64,
    /// Thread count for parallel training; `None` trains sequentially.
    parallelism: Option<usize>,
    estimators: EstimatorFactory,
    reports: Mutex<HashMap<Vec<AlgorithmId>, Arc<TrainingReport>>>,
    training_data: Mutex<Option<Arc<TrainingData>>>,
    trainings: AtomicUsize,
}

impl ModelTrainer {
    /// Create a sequential trainer.
    pub fn new<P: Into<PathBuf>>(corpus: Arc<CorpusStore>, model_dir: P, seed: u64) -> Self {
        ModelTrainer {
            corpus,
            model_dir: model_dir.into(),
            seed,
            parallelism: None,
            estimators: Arc::new(|algorithm: AlgorithmId, seed| algorithm.estimator(seed)),
            reports: Mutex::new(HashMap::new()),
            training_data: Mutex::new(None),
            trainings: AtomicUsize::new(0),
        }
    }

    /// Create a trainer from the top-level configuration.
    pub fn from_config(corpus: Arc<CorpusStore>, config: &SentivoteConfig) -> Self {
        let trainer = Self::new(corpus, config.model_dir(), config.training_seed);
        if config.parallel_training {
            trainer.with_parallelism(config.effective_training_threads())
        } else {
            trainer
        }
    }

    /// Train independent algorithms concurrently on `threads` workers.
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads.max(1));
        self
    }

    /// Replace how estimators are built, e.g. to tune hyperparameters.
    pub fn with_estimator_factory(mut self, estimators: EstimatorFactory) -> Self {
        self.estimators = estimators;
        self
    }

    pub fn corpus(&self) -> &Arc<CorpusStore> {
        &self.corpus
    }

    /// Artifact location for one algorithm.
    pub fn model_path(&self, algorithm: AlgorithmId) -> PathBuf {
        self.model_dir.join(format!("{}.bin", algorithm.name()))
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Number of models fitted by this trainer (cache hits excluded).
    pub fn training_count(&self) -> usize {
        self.trainings.load(Ordering::SeqCst)
    }

    /// One model per requested algorithm that could be loaded or trained,
    /// in request order, plus the algorithms that failed.
    ///
    /// Fails only when no training data is available at all.
    pub fn get_trained_models(&self, algorithms: &[AlgorithmId]) -> Result<Arc<TrainingReport>> {
        let mut reports = self.reports.lock();
        if let Some(report) = reports.get(algorithms) {
            debug!("Returning memoized models for {:?}", algorithms);
            return Ok(report.clone());
        }

        let start = Instant::now();
        let corpus = self.corpus.load_corpus()?;
        let fingerprint = corpus.vocabulary().fingerprint();

        let mut loaded: Vec<Option<Arc<TrainedModel>>> = algorithms
            .iter()
            .map(|&algorithm| self.load_model(algorithm, fingerprint).map(Arc::new))
            .collect();

        let pending: Vec<AlgorithmId> = algorithms
            .iter()
            .zip(&loaded)
            .filter(|(_, model)| model.is_none())
            .map(|(&algorithm, _)| algorithm)
            .collect();

        let mut trained: HashMap<AlgorithmId, Result<Arc<TrainedModel>>> = HashMap::new();
        if !pending.is_empty() {
            let data = self.training_data(&corpus)?;
            for (algorithm, result) in self.train_all(&pending, &data)? {
                let result = result.map(|model| {
                    self.persist(&model, fingerprint);
                    Arc::new(model)
                });
                trained.insert(algorithm, result);
            }
        }

        let mut report = TrainingReport::new();
        for (algorithm, cached) in algorithms.iter().zip(loaded.iter_mut()) {
            if let Some(model) = cached.take() {
                report.push_model(model, ModelSource::Cache);
                continue;
            }
            match trained.get(algorithm) {
                Some(Ok(model)) => report.push_model(model.clone(), ModelSource::Trained),
                Some(Err(e)) => {
                    warn!("Training {algorithm} failed: {e}");
                    report.push_failure(*algorithm, failure_reason(e));
                }
                None => report.push_failure(*algorithm, "not trained".to_string()),
            }
        }

        info!(
            "Models ready: {} of {} ({} trained) in {:.2}s",
            report.models().len(),
            algorithms.len(),
            report.trained_count(),
            start.elapsed().as_secs_f64()
        );

        let report = Arc::new(report);
        if report.is_complete() {
            reports.insert(algorithms.to_vec(), report.clone());
        }
        Ok(report)
    }

    /// Training partition as a shared sparse matrix, built once.
    fn training_data(&self, corpus: &Corpus) -> Result<Arc<TrainingData>> {
        let mut cached = self.training_data.lock();
        let fingerprint = corpus.vocabulary().fingerprint();
        if let Some(data) = cached.as_ref().filter(|d| d.fingerprint() == fingerprint) {
            return Ok(data.clone());
        }

        let extractor = FeatureExtractor::with_analyzer(
            corpus.vocabulary().clone(),
            self.corpus.analyzer().clone(),
        );
        let examples = extractor.extract_examples(corpus.training_documents())?;
        let data = Arc::new(TrainingData::from_examples(corpus.vocabulary(), &examples)?);
        debug!(
            "Extracted {} training examples over {} features",
            data.len(),
            data.n_features()
        );
        *cached = Some(data.clone());
        Ok(data)
    }

    fn train_all(
        &self,
        pending: &[AlgorithmId],
        data: &TrainingData,
    ) -> Result<Vec<(AlgorithmId, Result<TrainedModel>)>> {
        match self.parallelism {
            Some(threads) if pending.len() > 1 => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("sentivote-train-{i}"))
                    .build()
                    .map_err(|e| {
                        SentivoteError::other(format!("Failed to create thread pool: {e}"))
                    })?;
                Ok(pool.install(|| {
                    pending
                        .par_iter()
                        .map(|&algorithm| (algorithm, self.fit(algorithm, data)))
                        .collect()
                }))
            }
            _ => Ok(pending
                .iter()
                .map(|&algorithm| (algorithm, self.fit(algorithm, data)))
                .collect()),
        }
    }

    fn fit(&self, algorithm: AlgorithmId, data: &TrainingData) -> Result<TrainedModel> {
        let start = Instant::now();
        info!("Training {algorithm} on {} examples", data.len());
        let model = (self.estimators)(algorithm, self.seed).fit(data)?;
        self.trainings.fetch_add(1, Ordering::SeqCst);
        debug!(
            "Trained {algorithm} in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        Ok(model)
    }

    /// Load a model artifact that matches the algorithm and the vocabulary.
    fn load_model(&self, algorithm: AlgorithmId, fingerprint: u64) -> Option<TrainedModel> {
        let path = self.model_path(algorithm);
        match read_artifact::<TrainedModel>(&path, ArtifactKind::Model) {
            Ok(Some((header, model))) => {
                if header.fingerprint != fingerprint {
                    warn!(
                        "Model artifact {} was trained on a different vocabulary; retraining",
                        path.display()
                    );
                    None
                } else if model.algorithm() != algorithm {
                    warn!(
                        "Model artifact {} holds {} instead of {algorithm}; retraining",
                        path.display(),
                        model.algorithm()
                    );
                    None
                } else {
                    debug!("Loaded {algorithm} from {}", path.display());
                    Some(model)
                }
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unusable model artifact: {e}");
                None
            }
        }
    }

    fn persist(&self, model: &TrainedModel, fingerprint: u64) {
        let path = self.model_path(model.algorithm());
        match write_artifact(&path, ArtifactKind::Model, fingerprint, model) {
            Ok(()) => debug!("Wrote model artifact {}", path.display()),
            Err(e) => warn!("Failed to persist {}: {e}", model.algorithm()),
        }
    }
}

/// The reason recorded in a report, without the error kind prefix.
fn failure_reason(error: &SentivoteError) -> String {
    match error {
        SentivoteError::Training { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorpusConfig;
    use std::fs;
    use tempfile::TempDir;

    fn store(dir: &Path) -> Arc<CorpusStore> {
        let pos = dir.join("positive.txt");
        let neg = dir.join("negative.txt");
        fs::write(
            &pos,
            "simply wonderful\nreally enjoyed it\nbrilliantly funny\nloved every minute\n",
        )
        .unwrap();
        fs::write(
            &neg,
            "terribly boring\nreally hated it\npainfully slow\nwasted every minute\n",
        )
        .unwrap();

        let mut config = CorpusConfig::empty();
        config.positive_path = Some(pos);
        config.negative_path = Some(neg);
        config.test_size = 2;
        config.shuffle_seed = Some(3);
        config.pos_filter = None;
        Arc::new(CorpusStore::new(config, dir.join("cache").join("corpus.bin")))
    }

    #[test]
    fn test_second_request_is_memoized() {
        let dir = TempDir::new().unwrap();
        let trainer = ModelTrainer::new(store(dir.path()), dir.path().join("models"), 42);
        let ids = [AlgorithmId::MultinomialNb, AlgorithmId::DecisionTree];

        let first = trainer.get_trained_models(&ids).unwrap();
        assert_eq!(first.algorithms(), ids.to_vec());
        assert_eq!(trainer.training_count(), 2);

        let second = trainer.get_trained_models(&ids).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(trainer.training_count(), 2);
    }

    #[test]
    fn test_artifacts_are_reused_by_a_new_trainer() {
        let dir = TempDir::new().unwrap();
        let corpus = store(dir.path());
        let ids = [AlgorithmId::BernoulliNb, AlgorithmId::LinearSvc];

        ModelTrainer::new(corpus.clone(), dir.path().join("models"), 42)
            .get_trained_models(&ids)
            .unwrap();
        assert!(dir.path().join("models").join("linear_svc.bin").exists());

        let trainer = ModelTrainer::new(corpus, dir.path().join("models"), 42);
        let report = trainer.get_trained_models(&ids).unwrap();
        assert_eq!(trainer.training_count(), 0);
        assert_eq!(report.sources(), &[ModelSource::Cache, ModelSource::Cache]);
    }

    #[test]
    fn test_wrong_algorithm_in_artifact_is_retrained() {
        let dir = TempDir::new().unwrap();
        let corpus = store(dir.path());
        let trainer = ModelTrainer::new(corpus.clone(), dir.path().join("models"), 42);
        trainer
            .get_trained_models(&[AlgorithmId::MultinomialNb])
            .unwrap();
        fs::copy(
            trainer.model_path(AlgorithmId::MultinomialNb),
            trainer.model_path(AlgorithmId::BernoulliNb),
        )
        .unwrap();

        let fresh = ModelTrainer::new(corpus, dir.path().join("models"), 42);
        let report = fresh.get_trained_models(&[AlgorithmId::BernoulliNb]).unwrap();
        assert_eq!(fresh.training_count(), 1);
        assert_eq!(report.models()[0].algorithm(), AlgorithmId::BernoulliNb);
    }

    /// An estimator that always fails.
    struct Diverging(AlgorithmId);

    impl Estimator for Diverging {
        fn algorithm(&self) -> AlgorithmId {
            self.0
        }

        fn fit(&self, _data: &TrainingData) -> Result<TrainedModel> {
            Err(SentivoteError::training(self.0.name(), "parameters diverged"))
        }
    }

    fn failing_on(failing: AlgorithmId) -> EstimatorFactory {
        Arc::new(move |algorithm: AlgorithmId, seed| -> Box<dyn Estimator> {
            if algorithm == failing {
                Box::new(Diverging(algorithm))
            } else {
                algorithm.estimator(seed)
            }
        })
    }

    #[test]
    fn test_failure_is_isolated_and_not_memoized() {
        let dir = TempDir::new().unwrap();
        let trainer = ModelTrainer::new(store(dir.path()), dir.path().join("models"), 42)
            .with_estimator_factory(failing_on(AlgorithmId::DecisionTree));
        let ids = [
            AlgorithmId::MultinomialNb,
            AlgorithmId::DecisionTree,
            AlgorithmId::BernoulliNb,
        ];

        let first = trainer.get_trained_models(&ids).unwrap();
        assert!(!first.is_complete());
        assert_eq!(
            first.algorithms(),
            vec![AlgorithmId::MultinomialNb, AlgorithmId::BernoulliNb]
        );
        assert_eq!(first.failures().len(), 1);
        assert_eq!(first.failures()[0].algorithm, AlgorithmId::DecisionTree);
        assert_eq!(first.failures()[0].reason, "parameters diverged");
        assert!(!trainer.model_path(AlgorithmId::DecisionTree).exists());
        assert_eq!(trainer.training_count(), 2);

        // A retry only refits the failed algorithm.
        let second = trainer.get_trained_models(&ids).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.sources(), &[ModelSource::Cache, ModelSource::Cache]);
        assert_eq!(second.failures().len(), 1);
        assert_eq!(trainer.training_count(), 2);
    }

    #[test]
    fn test_empty_training_partition_fails_every_algorithm() {
        let dir = TempDir::new().unwrap();
        let documents = store(dir.path()).load_corpus().unwrap().len();

        // Hold every document out of training.
        let mut settings = CorpusConfig::empty();
        settings.positive_path = Some(dir.path().join("positive.txt"));
        settings.negative_path = Some(dir.path().join("negative.txt"));
        settings.test_size = documents;
        settings.pos_filter = None;
        let corpus = Arc::new(CorpusStore::new(settings, dir.path().join("all-test.bin")));

        let trainer = ModelTrainer::new(corpus, dir.path().join("models"), 42);
        let report = trainer.get_trained_models(&AlgorithmId::ALL).unwrap();
        assert!(report.models().is_empty());
        assert_eq!(report.failures().len(), AlgorithmId::ALL.len());
        assert!(
            report
                .failures()
                .iter()
                .all(|f| f.reason == "training set is empty")
        );
        assert_eq!(trainer.training_count(), 0);

        let again = trainer.get_trained_models(&AlgorithmId::ALL).unwrap();
        assert!(!Arc::ptr_eq(&report, &again));
    }

    #[test]
    fn test_model_paths() {
        let dir = TempDir::new().unwrap();
        let trainer = ModelTrainer::new(store(dir.path()), "cache/models", 42);
        assert_eq!(
            trainer.model_path(AlgorithmId::SgdClassifier),
            PathBuf::from("cache/models/sgd_classifier.bin")
        );
    }
}
