//! Majority voting over heterogeneous models.

use std::fmt;
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use crate::classifier::{AlgorithmId, SentimentModel};
use crate::corpus::Label;
use crate::ensemble::evaluation::{ConfusionMatrix, Evaluation, MemberAccuracy};
use crate::error::{Result, SentivoteError};
use crate::features::{FeatureVector, LabeledExample};
use crate::trainer::{ModelTrainer, TrainingReport};

/// A named ensemble member.
#[derive(Clone)]
pub struct Member {
    pub name: String,
    pub model: Arc<dyn SentimentModel>,
}

impl Member {
    pub fn new<S: Into<String>>(name: S, model: Arc<dyn SentimentModel>) -> Self {
        Member {
            name: name.into(),
            model,
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Member").field(&self.name).finish()
    }
}

/// Outcome of one vote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vote {
    pub label: Label,
    /// `votes_for / members`.
    pub confidence: f64,
    pub votes_for: usize,
    pub members: usize,
}

/// Pick the most frequent label. Among labels tied for the highest count the
/// one whose first vote comes earliest wins.
pub fn tally(votes: &[Label]) -> Result<Vote> {
    if votes.is_empty() {
        return Err(SentivoteError::configuration("ensemble has no members"));
    }

    // (label, count) in order of first appearance.
    let mut counts: Vec<(Label, usize)> = Vec::with_capacity(2);
    for &label in votes {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }

    let mut winner = counts[0];
    for &(label, count) in &counts[1..] {
        if count > winner.1 {
            winner = (label, count);
        }
    }

    Ok(Vote {
        label: winner.0,
        confidence: winner.1 as f64 / votes.len() as f64,
        votes_for: winner.1,
        members: votes.len(),
    })
}

#[derive(Debug)]
enum State {
    Untrained,
    Ready(Vec<Member>),
}

/// Classifies by majority vote of its members.
///
/// Starts untrained (unless built from members) and becomes ready once
/// [`train`](VotingEnsemble::train) succeeds. Readiness is permanent.
#[derive(Debug)]
pub struct VotingEnsemble {
    algorithms: Vec<AlgorithmId>,
    allow_partial: bool,
    state: State,
    last_confidence: Option<f64>,
}

impl VotingEnsemble {
    /// An untrained ensemble over the given algorithms, in member order.
    pub fn untrained(algorithms: Vec<AlgorithmId>) -> Self {
        VotingEnsemble {
            algorithms,
            allow_partial: false,
            state: State::Untrained,
            last_confidence: None,
        }
    }

    /// Accept an ensemble missing the algorithms that failed to train.
    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    /// A ready ensemble from explicit members.
    pub fn from_members(members: Vec<Member>) -> Result<Self> {
        if members.is_empty() {
            return Err(SentivoteError::configuration("ensemble has no members"));
        }
        Ok(VotingEnsemble {
            algorithms: Vec::new(),
            allow_partial: false,
            state: State::Ready(members),
            last_confidence: None,
        })
    }

    /// A ready ensemble from the models of a training report.
    pub fn from_report(report: &TrainingReport) -> Result<Self> {
        let mut ensemble = Self::from_members(members_of(report))?;
        ensemble.algorithms = report.algorithms();
        Ok(ensemble)
    }

    /// Obtain the models from `trainer` and become ready.
    ///
    /// Does nothing when already ready. Fails when training data is missing,
    /// when no model could be produced, or when some algorithm failed and a
    /// partial ensemble is not allowed.
    pub fn train(&mut self, trainer: &ModelTrainer) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        if self.algorithms.is_empty() {
            return Err(SentivoteError::configuration("ensemble has no members"));
        }

        let report = trainer.get_trained_models(&self.algorithms)?;
        if !report.is_complete() {
            let names: Vec<&str> = report.failures().iter().map(|f| f.algorithm.name()).collect();
            let reasons: Vec<&str> = report.failures().iter().map(|f| f.reason.as_str()).collect();
            if !self.allow_partial || report.models().is_empty() {
                return Err(SentivoteError::training(names.join(","), reasons.join("; ")));
            }
            warn!(
                "Continuing with {} of {} members; failed: {}",
                report.models().len(),
                self.algorithms.len(),
                names.join(", ")
            );
        }

        self.algorithms = report.algorithms();
        self.state = State::Ready(members_of(&report));
        info!("Ensemble ready with {} members", self.algorithms.len());
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Algorithms of the members (or the configured ones while untrained).
    pub fn algorithms(&self) -> &[AlgorithmId] {
        &self.algorithms
    }

    /// Member names in voting order; empty while untrained.
    pub fn member_names(&self) -> Vec<&str> {
        match &self.state {
            State::Ready(members) => members.iter().map(|m| m.name.as_str()).collect(),
            State::Untrained => Vec::new(),
        }
    }

    fn members(&self) -> Result<&[Member]> {
        match &self.state {
            State::Ready(members) => Ok(members),
            State::Untrained => Err(SentivoteError::not_ready(
                "ensemble has not been trained",
            )),
        }
    }

    /// Every member's label, in member order.
    pub fn votes(&self, features: &FeatureVector) -> Result<Vec<Label>> {
        let active = features.active_indices();
        Ok(self
            .members()?
            .iter()
            .map(|m| m.model.classify_active(&active))
            .collect())
    }

    /// Vote without recording the confidence.
    pub fn vote(&self, features: &FeatureVector) -> Result<Vote> {
        tally(&self.votes(features)?)
    }

    /// Majority label; the vote fraction becomes [`last_confidence`](Self::last_confidence).
    pub fn classify(&mut self, features: &FeatureVector) -> Result<Label> {
        let vote = self.vote(features)?;
        self.last_confidence = Some(vote.confidence);
        Ok(vote.label)
    }

    /// Confidence of the most recent [`classify`](Self::classify) call.
    pub fn last_confidence(&self) -> Option<f64> {
        self.last_confidence
    }

    /// Accuracy of every member and of the ensemble on held-out examples.
    pub fn evaluate(&self, examples: &[LabeledExample]) -> Result<Evaluation> {
        let members = self.members()?;
        let mut correct = vec![0usize; members.len()];
        let mut confusion = ConfusionMatrix::default();

        for example in examples {
            let votes = self.votes(&example.features)?;
            for (hits, label) in correct.iter_mut().zip(&votes) {
                if *label == example.label {
                    *hits += 1;
                }
            }
            confusion.record(example.label, tally(&votes)?.label);
        }

        let total = examples.len();
        Ok(Evaluation {
            examples: total,
            members: members
                .iter()
                .zip(correct)
                .map(|(m, hits)| MemberAccuracy {
                    name: m.name.clone(),
                    accuracy: ratio(hits, total),
                })
                .collect(),
            ensemble_accuracy: confusion.accuracy(),
            confusion,
        })
    }
}

fn members_of(report: &TrainingReport) -> Vec<Member> {
    report
        .models()
        .iter()
        .map(|model| {
            let name = model.algorithm().name();
            let model: Arc<dyn SentimentModel> = model.clone();
            Member::new(name, model)
        })
        .collect()
}

pub(crate) fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
