//! Outcome of a training request.

use std::sync::Arc;

use serde::Serialize;

use crate::classifier::{AlgorithmId, TrainedModel};

/// Where a model in a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// Loaded from a valid artifact.
    Cache,
    /// Trained by this request.
    Trained,
}

/// One algorithm that failed to produce a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingFailure {
    pub algorithm: AlgorithmId,
    pub reason: String,
}

/// Models for the requested algorithms plus the algorithms that failed.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    models: Vec<Arc<TrainedModel>>,
    sources: Vec<ModelSource>,
    failures: Vec<TrainingFailure>,
}

impl TrainingReport {
    pub(crate) fn new() -> Self {
        TrainingReport {
            models: Vec::new(),
            sources: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn push_model(&mut self, model: Arc<TrainedModel>, source: ModelSource) {
        self.models.push(model);
        self.sources.push(source);
    }

    pub(crate) fn push_failure(&mut self, algorithm: AlgorithmId, reason: String) {
        self.failures.push(TrainingFailure { algorithm, reason });
    }

    /// Successful models, in request order.
    pub fn models(&self) -> &[Arc<TrainedModel>] {
        &self.models
    }

    /// Algorithms of the successful models, in request order.
    pub fn algorithms(&self) -> Vec<AlgorithmId> {
        self.models.iter().map(|m| m.algorithm()).collect()
    }

    /// Where each model came from, parallel to [`models`](Self::models).
    pub fn sources(&self) -> &[ModelSource] {
        &self.sources
    }

    pub fn failures(&self) -> &[TrainingFailure] {
        &self.failures
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of models trained (not loaded) by this request.
    pub fn trained_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| **s == ModelSource::Trained)
            .count()
    }
}
