//! Error types for the sentivote library.
//!
//! All errors are represented by the [`SentivoteError`] enum. The variants are
//! kept distinguishable so a pipeline driver can decide whether a failure is
//! fatal (no training data), recoverable (one algorithm failed to fit) or a
//! per-item problem.
//!
//! # Examples
//!
//! ```
//! use sentivote::error::{SentivoteError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SentivoteError::configuration("ensemble has no members"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for sentivote operations.
#[derive(Error, Debug)]
pub enum SentivoteError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Training data is missing and no cached corpus can stand in for it.
    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// Malformed corpus input.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Corrupt, incompatible or stale cache artifact.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A single algorithm failed to fit.
    #[error("Training error ({algorithm}): {message}")]
    Training { algorithm: String, message: String },

    /// Invalid configuration (bad threshold, empty ensemble, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Classification requested before the ensemble was trained.
    #[error("Ensemble not ready: {0}")]
    NotReady(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Thread join errors
    #[error("Thread join error: {0}")]
    ThreadJoin(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delimited record parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with SentivoteError.
pub type Result<T> = std::result::Result<T, SentivoteError>;

impl SentivoteError {
    /// Create a new corpus-unavailable error.
    pub fn corpus_unavailable<S: Into<String>>(msg: S) -> Self {
        SentivoteError::CorpusUnavailable(msg.into())
    }

    /// Create a new corpus error.
    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        SentivoteError::Corpus(msg.into())
    }

    /// Create a new cache error.
    pub fn cache<S: Into<String>>(msg: S) -> Self {
        SentivoteError::Cache(msg.into())
    }

    /// Create a new training error for the named algorithm.
    pub fn training<A: Into<String>, S: Into<String>>(algorithm: A, msg: S) -> Self {
        SentivoteError::Training {
            algorithm: algorithm.into(),
            message: msg.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        SentivoteError::Configuration(msg.into())
    }

    /// Create a new not-ready error.
    pub fn not_ready<S: Into<String>>(msg: S) -> Self {
        SentivoteError::NotReady(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        SentivoteError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SentivoteError::Other(msg.into())
    }

    /// Whether the error means no usable training data exists.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SentivoteError::CorpusUnavailable(_) | SentivoteError::Configuration(_)
        )
    }
}
