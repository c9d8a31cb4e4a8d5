//! Linear classifiers: logistic regression, hinge-loss SGD and a linear SVM.
//!
//! All three produce the same [`LinearModel`]; they differ only in how the
//! weights are fitted.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::classifier::{
    AlgorithmId, Estimator, ModelKind, ModelMetadata, SentimentModel, TrainedModel, TrainingData,
    ensure_finite, sparse_dot,
};
use crate::corpus::Label;
use crate::error::Result;

/// Weight vector and bias. Non-negative decision values are positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearModel {
    fn zeros(n_features: usize) -> Self {
        LinearModel {
            weights: vec![0.0; n_features],
            bias: 0.0,
        }
    }

    /// Raw decision value for a document.
    pub fn decision_function(&self, active: &[usize]) -> f64 {
        sparse_dot(&self.weights, active) + self.bias
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    fn check(&self, algorithm: AlgorithmId) -> Result<()> {
        ensure_finite(algorithm, &self.weights)?;
        ensure_finite(algorithm, std::iter::once(&self.bias))
    }
}

impl SentimentModel for LinearModel {
    fn classify_active(&self, active: &[usize]) -> Label {
        Label::from_score(self.decision_function(active))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Add `scale` to the weights of every active feature.
fn add_active(weights: &mut [f64], active: &[usize], scale: f64) {
    for &j in active {
        if let Some(w) = weights.get_mut(j) {
            *w += scale;
        }
    }
}

/// L2-regularized logistic regression fitted by full-batch gradient descent.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Inverse regularization strength.
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the largest gradient component falls below this.
    pub tolerance: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 1.0,
            max_iter: 300,
            tolerance: 1e-5,
        }
    }
}

impl Estimator for LogisticRegression {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::LogisticRegression
    }

    fn fit(&self, data: &TrainingData) -> Result<TrainedModel> {
        data.require_examples(self.algorithm())?;
        let n = data.len() as f64;
        let mut model = LinearModel::zeros(data.n_features());
        let mut grad = vec![0.0; data.n_features()];
        let mut iterations = 0;

        while iterations < self.max_iter {
            iterations += 1;
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_bias = 0.0;

            for (active, label) in data.iter() {
                let target = if label == Label::Pos { 1.0 } else { 0.0 };
                let error = sigmoid(model.decision_function(active)) - target;
                grad_bias += error;
                add_active(&mut grad, active, error);
            }

            let mut largest = (grad_bias / n).abs();
            for (g, w) in grad.iter_mut().zip(&model.weights) {
                *g = *g / n + *w / (self.c * n);
                largest = largest.max(g.abs());
            }

            for (w, g) in model.weights.iter_mut().zip(&grad) {
                *w -= self.learning_rate * g;
            }
            model.bias -= self.learning_rate * grad_bias / n;

            if largest < self.tolerance {
                break;
            }
        }
        debug!("{} finished after {} iterations", self.algorithm(), iterations);
        model.check(self.algorithm())?;

        let metadata = ModelMetadata::new(self.algorithm(), data)
            .with_hyperparameter("c", self.c)
            .with_hyperparameter("learning_rate", self.learning_rate)
            .with_hyperparameter("iterations", iterations as f64);
        Ok(TrainedModel::new(
            metadata,
            ModelKind::LogisticRegression(model),
        ))
    }
}

/// Linear SVM trained by stochastic gradient descent on the hinge loss.
#[derive(Debug, Clone)]
pub struct SgdClassifier {
    /// L2 regularization strength.
    pub alpha: f64,
    /// Initial step size.
    pub eta0: f64,
    pub epochs: usize,
    pub seed: u64,
}

impl SgdClassifier {
    pub fn new(seed: u64) -> Self {
        Self {
            alpha: 1e-4,
            eta0: 0.1,
            epochs: 20,
            seed,
        }
    }
}

impl Estimator for SgdClassifier {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::SgdClassifier
    }

    fn fit(&self, data: &TrainingData) -> Result<TrainedModel> {
        data.require_examples(self.algorithm())?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..data.len()).collect();

        // True weights are `scale * v`, so the L2 shrink costs O(1) per step.
        let mut v = vec![0.0; data.n_features()];
        let mut scale = 1.0;
        let mut bias = 0.0;
        let mut t = 0usize;

        for _ in 0..self.epochs {
            order.shuffle(&mut rng);
            for &i in &order {
                let active = data.rows()[i].as_slice();
                let y = data.labels()[i].sign();
                let eta = self.eta0 / (1.0 + self.eta0 * self.alpha * t as f64);
                t += 1;

                let margin = y * (scale * sparse_dot(&v, active) + bias);
                scale *= 1.0 - eta * self.alpha;
                if margin < 1.0 {
                    add_active(&mut v, active, eta * y / scale);
                    bias += eta * y;
                }

                if scale < 1e-9 {
                    v.iter_mut().for_each(|x| *x *= scale);
                    scale = 1.0;
                }
            }
        }

        let model = LinearModel {
            weights: v.into_iter().map(|x| x * scale).collect(),
            bias,
        };
        model.check(self.algorithm())?;

        let metadata = ModelMetadata::new(self.algorithm(), data)
            .with_hyperparameter("alpha", self.alpha)
            .with_hyperparameter("eta0", self.eta0)
            .with_hyperparameter("epochs", self.epochs as f64);
        Ok(TrainedModel::new(metadata, ModelKind::SgdClassifier(model)))
    }
}

/// Linear SVM (hinge loss) solved by dual coordinate descent.
///
/// The bias is learned as the weight of an implicit always-present feature.
#[derive(Debug, Clone)]
pub struct LinearSvc {
    /// Penalty of the hinge loss.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the projected gradient spread falls below this.
    pub tolerance: f64,
    pub seed: u64,
}

impl LinearSvc {
    pub fn new(seed: u64) -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tolerance: 1e-3,
            seed,
        }
    }
}

impl Estimator for LinearSvc {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::LinearSvc
    }

    fn fit(&self, data: &TrainingData) -> Result<TrainedModel> {
        data.require_examples(self.algorithm())?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut model = LinearModel::zeros(data.n_features());
        let mut alpha = vec![0.0; data.len()];
        let q_diag: Vec<f64> = data
            .rows()
            .iter()
            .map(|active| active.iter().filter(|&&j| j < data.n_features()).count() as f64 + 1.0)
            .collect();
        let mut order: Vec<usize> = (0..data.len()).collect();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            iterations += 1;
            order.shuffle(&mut rng);
            let mut pg_max = f64::NEG_INFINITY;
            let mut pg_min = f64::INFINITY;

            for &i in &order {
                let active = data.rows()[i].as_slice();
                let y = data.labels()[i].sign();
                let g = y * model.decision_function(active) - 1.0;

                let pg = if alpha[i] <= 0.0 {
                    g.min(0.0)
                } else if alpha[i] >= self.c {
                    g.max(0.0)
                } else {
                    g
                };
                pg_max = pg_max.max(pg);
                pg_min = pg_min.min(pg);

                if pg.abs() > 1e-12 {
                    let old = alpha[i];
                    alpha[i] = (old - g / q_diag[i]).clamp(0.0, self.c);
                    let step = (alpha[i] - old) * y;
                    add_active(&mut model.weights, active, step);
                    model.bias += step;
                }
            }

            if pg_max - pg_min < self.tolerance {
                converged = true;
                break;
            }
        }

        if converged {
            debug!("{} converged after {} iterations", self.algorithm(), iterations);
        } else {
            debug!(
                "{} reached max_iter ({}) without converging",
                self.algorithm(),
                self.max_iter
            );
        }
        model.check(self.algorithm())?;

        let metadata = ModelMetadata::new(self.algorithm(), data)
            .with_hyperparameter("c", self.c)
            .with_hyperparameter("iterations", iterations as f64);
        Ok(TrainedModel::new(metadata, ModelKind::LinearSvc(model)))
    }
}
