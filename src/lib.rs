//! # Sentivote
//!
//! Ensemble sentiment classification for keyword-filtered text streams.
//!
//! ## Features
//!
//! - Labeled corpus loading with a POS-filtered vocabulary
//! - Seven independent classifiers combined by majority vote
//! - Fingerprinted on-disk caching of the corpus and every trained model
//! - Confidence-thresholded streaming classification with trend reporting

pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod storage;
pub mod trainer;

pub mod prelude {
    pub use crate::classifier::{AlgorithmId, SentimentModel, TrainedModel};
    pub use crate::config::SentivoteConfig;
    pub use crate::corpus::{CorpusStore, Document, Label};
    pub use crate::ensemble::{Vote, VotingEnsemble};
    pub use crate::error::{Result, SentivoteError};
    pub use crate::features::{FeatureExtractor, FeatureVector};
    pub use crate::pipeline::{ClassifiedText, SentimentPipeline};
    pub use crate::trainer::ModelTrainer;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
