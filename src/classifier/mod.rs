//! Sentiment classifiers.
//!
//! Every algorithm is an [`Estimator`] that fits a [`TrainedModel`] from
//! [`TrainingData`]; every trained model is a [`SentimentModel`]. The trainer
//! and the ensemble only see these traits, so algorithms are interchangeable.

pub mod linear;
pub mod mlp;
pub mod naive_bayes;
pub mod tree;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::corpus::Label;
use crate::error::{Result, SentivoteError};
use crate::features::{FeatureVector, LabeledExample, Vocabulary};

pub use linear::{LinearModel, LinearSvc, LogisticRegression, SgdClassifier};
pub use mlp::{MlpClassifier, MlpModel};
pub use naive_bayes::{BernoulliNaiveBayes, BernoulliNb, MultinomialNaiveBayes, MultinomialNb};
pub use tree::{DecisionTree, DecisionTreeClassifier};

/// Identifier of a supported algorithm.
///
/// The declaration order is the default ensemble member order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum AlgorithmId {
    MultinomialNb,
    BernoulliNb,
    LogisticRegression,
    SgdClassifier,
    LinearSvc,
    DecisionTree,
    MlpClassifier,
}

impl AlgorithmId {
    /// Every algorithm, in default member order.
    pub const ALL: [AlgorithmId; 7] = [
        AlgorithmId::MultinomialNb,
        AlgorithmId::BernoulliNb,
        AlgorithmId::LogisticRegression,
        AlgorithmId::SgdClassifier,
        AlgorithmId::LinearSvc,
        AlgorithmId::DecisionTree,
        AlgorithmId::MlpClassifier,
    ];

    /// Stable name, used in config files and artifact file names.
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmId::MultinomialNb => "multinomial_nb",
            AlgorithmId::BernoulliNb => "bernoulli_nb",
            AlgorithmId::LogisticRegression => "logistic_regression",
            AlgorithmId::SgdClassifier => "sgd_classifier",
            AlgorithmId::LinearSvc => "linear_svc",
            AlgorithmId::DecisionTree => "decision_tree",
            AlgorithmId::MlpClassifier => "mlp_classifier",
        }
    }

    /// Estimator with default hyperparameters. `seed` drives every random
    /// choice the algorithm makes.
    pub fn estimator(&self, seed: u64) -> Box<dyn Estimator> {
        match self {
            AlgorithmId::MultinomialNb => Box::new(MultinomialNb::default()),
            AlgorithmId::BernoulliNb => Box::new(BernoulliNb::default()),
            AlgorithmId::LogisticRegression => Box::new(LogisticRegression::default()),
            AlgorithmId::SgdClassifier => Box::new(SgdClassifier::new(seed)),
            AlgorithmId::LinearSvc => Box::new(LinearSvc::new(seed)),
            AlgorithmId::DecisionTree => Box::new(DecisionTreeClassifier::default()),
            AlgorithmId::MlpClassifier => Box::new(MlpClassifier::new(seed)),
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmId {
    type Err = SentivoteError;

    fn from_str(s: &str) -> Result<Self> {
        AlgorithmId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| SentivoteError::configuration(format!("unknown algorithm: {s}")))
    }
}

/// Anything that maps a feature vector to a sentiment label.
pub trait SentimentModel: Send + Sync {
    /// Classify from the ascending bit positions of the present words.
    fn classify_active(&self, active: &[usize]) -> Label;

    /// Classify a feature vector.
    fn classify(&self, features: &FeatureVector) -> Label {
        self.classify_active(&features.active_indices())
    }
}

/// A training algorithm.
pub trait Estimator: Send + Sync {
    /// Which algorithm this is.
    fn algorithm(&self) -> AlgorithmId;

    /// Fit a model. Fails on an empty training set or diverged parameters.
    fn fit(&self, data: &TrainingData) -> Result<TrainedModel>;
}

/// Sparse binary design matrix with labels.
///
/// Built once from the training partition and shared read-only by every
/// estimator.
#[derive(Debug, Clone)]
pub struct TrainingData {
    rows: Vec<Vec<usize>>,
    labels: Vec<Label>,
    n_features: usize,
    fingerprint: u64,
}

impl TrainingData {
    /// Build from labeled examples. All examples must share one vocabulary.
    pub fn from_examples(vocabulary: &Vocabulary, examples: &[LabeledExample]) -> Result<Self> {
        let fingerprint = vocabulary.fingerprint();
        let mut rows = Vec::with_capacity(examples.len());
        let mut labels = Vec::with_capacity(examples.len());

        for example in examples {
            if example.features.vocabulary().fingerprint() != fingerprint {
                return Err(SentivoteError::other(
                    "training example extracted against a different vocabulary",
                ));
            }
            rows.push(example.features.active_indices());
            labels.push(example.label);
        }

        Ok(TrainingData {
            rows,
            labels,
            n_features: vocabulary.len(),
            fingerprint,
        })
    }

    /// Build directly from active-index rows.
    pub fn from_rows(rows: Vec<Vec<usize>>, labels: Vec<Label>, n_features: usize) -> Self {
        debug_assert_eq!(rows.len(), labels.len());
        TrainingData {
            rows,
            labels,
            n_features,
            fingerprint: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Fingerprint of the vocabulary the rows were extracted against.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Iterate `(active indices, label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[usize], Label)> {
        self.rows
            .iter()
            .map(Vec::as_slice)
            .zip(self.labels.iter().copied())
    }

    /// Number of examples per label, indexed by [`Label::index`].
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0; 2];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }

    /// Majority label, positive on a tie.
    pub fn majority_label(&self) -> Label {
        let [pos, neg] = self.class_counts();
        if neg > pos { Label::Neg } else { Label::Pos }
    }

    /// The only label present, if the data is single-class.
    pub fn single_label(&self) -> Option<Label> {
        let first = *self.labels.first()?;
        self.labels.iter().all(|l| *l == first).then_some(first)
    }

    pub(crate) fn require_examples(&self, algorithm: AlgorithmId) -> Result<()> {
        if self.is_empty() {
            return Err(SentivoteError::training(
                algorithm.name(),
                "training set is empty",
            ));
        }
        Ok(())
    }
}

/// Information about a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub algorithm: AlgorithmId,
    /// Unique id of the run that produced the model.
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub training_examples: usize,
    pub vocabulary_size: usize,
    pub hyperparameters: BTreeMap<String, f64>,
}

impl ModelMetadata {
    pub fn new(algorithm: AlgorithmId, data: &TrainingData) -> Self {
        ModelMetadata {
            algorithm,
            run_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            training_examples: data.len(),
            vocabulary_size: data.n_features(),
            hyperparameters: BTreeMap::new(),
        }
    }

    pub fn with_hyperparameter<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.hyperparameters.insert(name.into(), value);
        self
    }
}

/// Fitted parameters of one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelKind {
    MultinomialNb(MultinomialNaiveBayes),
    BernoulliNb(BernoulliNaiveBayes),
    LogisticRegression(LinearModel),
    SgdClassifier(LinearModel),
    LinearSvc(LinearModel),
    DecisionTree(DecisionTree),
    MlpClassifier(MlpModel),
}

impl ModelKind {
    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            ModelKind::MultinomialNb(_) => AlgorithmId::MultinomialNb,
            ModelKind::BernoulliNb(_) => AlgorithmId::BernoulliNb,
            ModelKind::LogisticRegression(_) => AlgorithmId::LogisticRegression,
            ModelKind::SgdClassifier(_) => AlgorithmId::SgdClassifier,
            ModelKind::LinearSvc(_) => AlgorithmId::LinearSvc,
            ModelKind::DecisionTree(_) => AlgorithmId::DecisionTree,
            ModelKind::MlpClassifier(_) => AlgorithmId::MlpClassifier,
        }
    }

    fn as_model(&self) -> &dyn SentimentModel {
        match self {
            ModelKind::MultinomialNb(m) => m,
            ModelKind::BernoulliNb(m) => m,
            ModelKind::LogisticRegression(m)
            | ModelKind::SgdClassifier(m)
            | ModelKind::LinearSvc(m) => m,
            ModelKind::DecisionTree(m) => m,
            ModelKind::MlpClassifier(m) => m,
        }
    }
}

/// A fitted model with its metadata. This is what model artifacts hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    metadata: ModelMetadata,
    kind: ModelKind,
}

impl TrainedModel {
    pub fn new(metadata: ModelMetadata, kind: ModelKind) -> Self {
        TrainedModel { metadata, kind }
    }

    pub fn algorithm(&self) -> AlgorithmId {
        self.kind.algorithm()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }
}

impl SentimentModel for TrainedModel {
    fn classify_active(&self, active: &[usize]) -> Label {
        self.kind.as_model().classify_active(active)
    }
}

/// Reject parameters that contain NaN or infinity.
pub(crate) fn ensure_finite<'a, I>(algorithm: AlgorithmId, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a f64>,
{
    if values.into_iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SentivoteError::training(
            algorithm.name(),
            "parameters diverged to a non-finite value",
        ))
    }
}

/// Sum of `weights[i]` over the active indices that fall inside `weights`.
pub(crate) fn sparse_dot(weights: &[f64], active: &[usize]) -> f64 {
    active.iter().filter_map(|&i| weights.get(i)).sum()
}
