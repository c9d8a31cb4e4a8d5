//! Model training and caching.

pub mod model_trainer;
pub mod report;

pub use model_trainer::{EstimatorFactory, ModelTrainer};
pub use report::{ModelSource, TrainingFailure, TrainingReport};
