//! Multi-layer perceptron with one hidden layer.
//!
//! Inputs are binary and sparse, so the forward pass and the input-layer
//! update only touch the columns of the present words.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::classifier::{
    AlgorithmId, Estimator, ModelKind, ModelMetadata, SentimentModel, TrainedModel, TrainingData,
    ensure_finite,
};
use crate::corpus::Label;
use crate::error::{Result, SentivoteError};

/// Fitted network: `tanh` hidden layer, logistic output (probability of
/// the positive label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpModel {
    /// Row-major `n_features x hidden` input weights.
    input_weights: Vec<f64>,
    hidden_bias: Vec<f64>,
    output_weights: Vec<f64>,
    output_bias: f64,
}

impl MlpModel {
    fn hidden_size(&self) -> usize {
        self.hidden_bias.len()
    }

    fn n_features(&self) -> usize {
        self.input_weights.len() / self.hidden_size().max(1)
    }

    fn hidden(&self, active: &[usize]) -> Vec<f64> {
        let h = self.hidden_size();
        let mut z = self.hidden_bias.clone();
        for &j in active.iter().filter(|&&j| j < self.n_features()) {
            let row = &self.input_weights[j * h..(j + 1) * h];
            for (z, w) in z.iter_mut().zip(row) {
                *z += w;
            }
        }
        z.into_iter().map(f64::tanh).collect()
    }

    fn output(&self, hidden: &[f64]) -> f64 {
        let z: f64 = hidden
            .iter()
            .zip(&self.output_weights)
            .map(|(a, w)| a * w)
            .sum::<f64>()
            + self.output_bias;
        1.0 / (1.0 + (-z).exp())
    }

    /// Probability that the document is positive.
    pub fn predict_proba(&self, active: &[usize]) -> f64 {
        self.output(&self.hidden(active))
    }

    fn values(&self) -> impl Iterator<Item = &f64> {
        self.input_weights
            .iter()
            .chain(&self.hidden_bias)
            .chain(&self.output_weights)
            .chain(std::iter::once(&self.output_bias))
    }
}

impl SentimentModel for MlpModel {
    fn classify_active(&self, active: &[usize]) -> Label {
        if self.predict_proba(active) >= 0.5 {
            Label::Pos
        } else {
            Label::Neg
        }
    }
}

/// Stochastic gradient descent on the log loss with early stopping.
#[derive(Debug, Clone)]
pub struct MlpClassifier {
    pub hidden_size: usize,
    pub learning_rate: f64,
    /// L2 penalty.
    pub alpha: f64,
    pub max_epochs: usize,
    /// Minimum improvement of the epoch loss that resets the patience counter.
    pub tolerance: f64,
    /// Epochs without improvement before stopping.
    pub patience: usize,
    pub seed: u64,
}

impl MlpClassifier {
    pub fn new(seed: u64) -> Self {
        Self {
            hidden_size: 16,
            learning_rate: 0.1,
            alpha: 1e-4,
            max_epochs: 200,
            tolerance: 1e-4,
            patience: 10,
            seed,
        }
    }

    fn initialize(&self, n_features: usize, rng: &mut StdRng) -> MlpModel {
        let h = self.hidden_size;
        let input_bound = (6.0 / (n_features + h) as f64).sqrt();
        let output_bound = (6.0 / (h + 1) as f64).sqrt();
        MlpModel {
            input_weights: (0..n_features * h)
                .map(|_| rng.random_range(-input_bound..input_bound))
                .collect(),
            hidden_bias: (0..h)
                .map(|_| rng.random_range(-input_bound..input_bound))
                .collect(),
            output_weights: (0..h)
                .map(|_| rng.random_range(-output_bound..output_bound))
                .collect(),
            output_bias: 0.0,
        }
    }

    /// One SGD step; returns the example's log loss before the update.
    fn step(&self, model: &mut MlpModel, active: &[usize], target: f64) -> f64 {
        let h = model.hidden_size();
        let n_features = model.n_features();
        let hidden = model.hidden(active);
        let p = model.output(&hidden);
        let loss = -(target * p.max(1e-12).ln() + (1.0 - target) * (1.0 - p).max(1e-12).ln());

        let delta_out = p - target;
        let lr = self.learning_rate;
        let delta_hidden: Vec<f64> = hidden
            .iter()
            .zip(&model.output_weights)
            .map(|(a, w)| delta_out * w * (1.0 - a * a))
            .collect();

        for (w, a) in model.output_weights.iter_mut().zip(&hidden) {
            *w -= lr * (delta_out * a + self.alpha * *w);
        }
        model.output_bias -= lr * delta_out;

        for &j in active.iter().filter(|&&j| j < n_features) {
            let row = &mut model.input_weights[j * h..(j + 1) * h];
            for (w, d) in row.iter_mut().zip(&delta_hidden) {
                *w -= lr * (d + self.alpha * *w);
            }
        }
        for (b, d) in model.hidden_bias.iter_mut().zip(&delta_hidden) {
            *b -= lr * d;
        }
        loss
    }
}

impl Estimator for MlpClassifier {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::MlpClassifier
    }

    fn fit(&self, data: &TrainingData) -> Result<TrainedModel> {
        data.require_examples(self.algorithm())?;
        if self.hidden_size == 0 {
            return Err(SentivoteError::training(
                self.algorithm().name(),
                "hidden_size must be positive",
            ));
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut model = self.initialize(data.n_features(), &mut rng);
        let mut order: Vec<usize> = (0..data.len()).collect();

        let mut best_loss = f64::INFINITY;
        let mut stale = 0;
        let mut epochs = 0;
        while epochs < self.max_epochs {
            epochs += 1;
            order.shuffle(&mut rng);
            let mut total = 0.0;
            for &i in &order {
                let target = if data.labels()[i] == Label::Pos { 1.0 } else { 0.0 };
                total += self.step(&mut model, &data.rows()[i], target);
            }
            let loss = total / data.len() as f64;
            if !loss.is_finite() {
                break;
            }

            if loss < best_loss - self.tolerance {
                best_loss = loss;
                stale = 0;
            } else {
                stale += 1;
                if stale >= self.patience {
                    break;
                }
            }
        }
        debug!(
            "{} stopped after {} epochs (loss {:.4})",
            self.algorithm(),
            epochs,
            best_loss
        );
        ensure_finite(self.algorithm(), model.values())?;

        let metadata = ModelMetadata::new(self.algorithm(), data)
            .with_hyperparameter("hidden_size", self.hidden_size as f64)
            .with_hyperparameter("learning_rate", self.learning_rate)
            .with_hyperparameter("alpha", self.alpha)
            .with_hyperparameter("epochs", epochs as f64);
        Ok(TrainedModel::new(metadata, ModelKind::MlpClassifier(model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::{assert_handles_degenerate, assert_learns_separable, separable};

    #[test]
    fn test_mlp_learns() {
        assert_learns_separable(&MlpClassifier::new(42));
        assert_handles_degenerate(&MlpClassifier::new(42));
    }

    #[test]
    fn test_same_seed_same_model() {
        let data = separable();
        let a = MlpClassifier::new(3).fit(&data).unwrap();
        let b = MlpClassifier::new(3).fit(&data).unwrap();
        assert_eq!(a.kind(), b.kind());

        let c = MlpClassifier::new(4).fit(&data).unwrap();
        assert_ne!(a.kind(), c.kind());
    }

    #[test]
    fn test_zero_hidden_units_is_rejected() {
        let mlp = MlpClassifier {
            hidden_size: 0,
            ..MlpClassifier::new(1)
        };
        let featureless = TrainingData::from_rows(
            vec![vec![], vec![]],
            vec![Label::Pos, Label::Neg],
            0,
        );
        for data in [featureless, separable()] {
            match mlp.fit(&data) {
                Err(SentivoteError::Training { algorithm, message }) => {
                    assert_eq!(algorithm, "mlp_classifier");
                    assert!(message.contains("hidden_size"));
                }
                other => panic!("expected a training error, got {:?}", other.map(|m| m.algorithm())),
            }
        }
    }

    #[test]
    fn test_probabilities_are_bounded() {
        let model = MlpClassifier::new(1).fit(&separable()).unwrap();
        let ModelKind::MlpClassifier(mlp) = model.kind() else {
            panic!("not an mlp");
        };
        let cases: [&[usize]; 4] = [&[], &[0], &[0, 1, 2, 3], &[99]];
        for active in cases {
            let p = mlp.predict_proba(active);
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
