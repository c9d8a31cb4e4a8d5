//! Naive Bayes over binary word-presence features.

use serde::{Deserialize, Serialize};

use crate::classifier::{
    AlgorithmId, Estimator, ModelKind, ModelMetadata, SentimentModel, TrainedModel, TrainingData,
    ensure_finite,
};
use crate::corpus::Label;
use crate::error::Result;

/// Per-class document counts and per-class, per-feature presence counts.
struct Counts {
    docs: [usize; 2],
    present: [Vec<f64>; 2],
}

fn count(data: &TrainingData) -> Counts {
    let n = data.n_features();
    let mut counts = Counts {
        docs: [0; 2],
        present: [vec![0.0; n], vec![0.0; n]],
    };
    for (active, label) in data.iter() {
        let c = label.index();
        counts.docs[c] += 1;
        for &j in active {
            if j < n {
                counts.present[c][j] += 1.0;
            }
        }
    }
    counts
}

/// Empirical log prior; a class without examples gets negative infinity.
fn log_priors(docs: [usize; 2]) -> [f64; 2] {
    let total = (docs[0] + docs[1]) as f64;
    docs.map(|d| {
        if d == 0 {
            f64::NEG_INFINITY
        } else {
            (d as f64 / total).ln()
        }
    })
}

/// Pick the higher score; ties go to the positive label.
fn argmax(scores: [f64; 2]) -> Label {
    if scores[Label::Neg.index()] > scores[Label::Pos.index()] {
        Label::Neg
    } else {
        Label::Pos
    }
}

/// Multinomial naive Bayes with Laplace/Lidstone smoothing.
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    /// Additive smoothing.
    pub alpha: f64,
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

/// Fitted multinomial model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNaiveBayes {
    class_log_prior: [f64; 2],
    feature_log_prob: [Vec<f64>; 2],
}

impl Estimator for MultinomialNb {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::MultinomialNb
    }

    fn fit(&self, data: &TrainingData) -> Result<TrainedModel> {
        data.require_examples(self.algorithm())?;
        let n = data.n_features() as f64;
        let counts = count(data);

        let feature_log_prob = counts.present.map(|present| {
            let total: f64 = present.iter().sum::<f64>() + self.alpha * n;
            present
                .iter()
                .map(|c| ((c + self.alpha) / total).ln())
                .collect::<Vec<f64>>()
        });
        for row in &feature_log_prob {
            ensure_finite(self.algorithm(), row)?;
        }

        let model = MultinomialNaiveBayes {
            class_log_prior: log_priors(counts.docs),
            feature_log_prob,
        };
        let metadata =
            ModelMetadata::new(self.algorithm(), data).with_hyperparameter("alpha", self.alpha);
        Ok(TrainedModel::new(metadata, ModelKind::MultinomialNb(model)))
    }
}

impl SentimentModel for MultinomialNaiveBayes {
    fn classify_active(&self, active: &[usize]) -> Label {
        let scores = Label::ALL.map(|label| {
            let c = label.index();
            let log_prob = &self.feature_log_prob[c];
            self.class_log_prior[c] + active.iter().filter_map(|&j| log_prob.get(j)).sum::<f64>()
        });
        argmax(scores)
    }
}

/// Bernoulli naive Bayes: absent words count as evidence too.
#[derive(Debug, Clone)]
pub struct BernoulliNb {
    /// Additive smoothing.
    pub alpha: f64,
}

impl Default for BernoulliNb {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

/// Fitted Bernoulli model.
///
/// The score of a document is `neg_sum[c] + sum(delta[c][j] for present j)`
/// where `neg_sum[c]` is the log likelihood of every word being absent and
/// `delta[c][j] = log p - log (1 - p)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BernoulliNaiveBayes {
    class_log_prior: [f64; 2],
    neg_sum: [f64; 2],
    delta: [Vec<f64>; 2],
}

impl Estimator for BernoulliNb {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::BernoulliNb
    }

    fn fit(&self, data: &TrainingData) -> Result<TrainedModel> {
        data.require_examples(self.algorithm())?;
        let counts = count(data);

        let mut neg_sum = [0.0; 2];
        let mut delta: [Vec<f64>; 2] = [Vec::new(), Vec::new()];
        for c in 0..2 {
            let denominator = counts.docs[c] as f64 + 2.0 * self.alpha;
            delta[c] = counts.present[c]
                .iter()
                .map(|present| {
                    let p = (present + self.alpha) / denominator;
                    neg_sum[c] += (1.0 - p).ln();
                    p.ln() - (1.0 - p).ln()
                })
                .collect();
            ensure_finite(self.algorithm(), &delta[c])?;
        }
        ensure_finite(self.algorithm(), &neg_sum)?;

        let model = BernoulliNaiveBayes {
            class_log_prior: log_priors(counts.docs),
            neg_sum,
            delta,
        };
        let metadata =
            ModelMetadata::new(self.algorithm(), data).with_hyperparameter("alpha", self.alpha);
        Ok(TrainedModel::new(metadata, ModelKind::BernoulliNb(model)))
    }
}

impl SentimentModel for BernoulliNaiveBayes {
    fn classify_active(&self, active: &[usize]) -> Label {
        let scores = Label::ALL.map(|label| {
            let c = label.index();
            let delta = &self.delta[c];
            self.class_log_prior[c]
                + self.neg_sum[c]
                + active.iter().filter_map(|&j| delta.get(j)).sum::<f64>()
        });
        argmax(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::{assert_handles_degenerate, assert_learns_separable};

    #[test]
    fn test_multinomial_learns() {
        assert_learns_separable(&MultinomialNb::default());
        assert_handles_degenerate(&MultinomialNb::default());
    }

    #[test]
    fn test_bernoulli_learns() {
        assert_learns_separable(&BernoulliNb::default());
        assert_handles_degenerate(&BernoulliNb::default());
    }

    #[test]
    fn test_multinomial_probabilities() {
        // Class pos: feature 0 twice; class neg: feature 1 once.
        let data = TrainingData::from_rows(
            vec![vec![0], vec![0], vec![1]],
            vec![Label::Pos, Label::Pos, Label::Neg],
            2,
        );
        let model = MultinomialNb::default().fit(&data).unwrap();
        let ModelKind::MultinomialNb(nb) = model.kind() else {
            panic!("wrong model kind");
        };
        // (2 + 1) / (2 + 2) and (0 + 1) / (2 + 2)
        assert!((nb.feature_log_prob[0][0] - (0.75f64).ln()).abs() < 1e-12);
        assert!((nb.feature_log_prob[0][1] - (0.25f64).ln()).abs() < 1e-12);
        assert!((nb.class_log_prior[1] - (1.0f64 / 3.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_bernoulli_uses_absence() {
        // Word 0 appears in every positive document, never in a negative one.
        // A document without any word should lean negative.
        let data = TrainingData::from_rows(
            vec![vec![0], vec![0, 1], vec![1], vec![]],
            vec![Label::Pos, Label::Pos, Label::Neg, Label::Neg],
            2,
        );
        let model = BernoulliNb::default().fit(&data).unwrap();
        assert_eq!(model.classify_active(&[]), Label::Neg);
        assert_eq!(model.classify_active(&[0]), Label::Pos);
    }
}
