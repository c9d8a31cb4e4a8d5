//! Voting ensemble and its evaluation.

pub mod evaluation;
pub mod voting;

pub use evaluation::{ConfusionMatrix, Evaluation, MemberAccuracy};
pub use voting::{Member, Vote, VotingEnsemble, tally};
