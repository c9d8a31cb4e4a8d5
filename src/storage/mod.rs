//! Persistent artifact storage for parsed corpora and trained models.

pub mod artifact;

pub use artifact::{ArtifactHeader, ArtifactKind, FORMAT_VERSION, read_artifact, write_artifact};
