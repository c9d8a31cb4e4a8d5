//! Held-out evaluation results.

use serde::Serialize;

use crate::corpus::Label;
use crate::ensemble::voting::ratio;

/// Accuracy of one ensemble member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberAccuracy {
    pub name: String,
    pub accuracy: f64,
}

/// Counts of (gold, predicted) label pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// Indexed `[gold][predicted]` by [`Label::index`].
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn record(&mut self, gold: Label, predicted: Label) {
        self.counts[gold.index()][predicted.index()] += 1;
    }

    pub fn get(&self, gold: Label, predicted: Label) -> usize {
        self.counts[gold.index()][predicted.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        Label::ALL.iter().map(|&l| self.get(l, l)).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Fraction of documents predicted as `label` that really are.
    pub fn precision(&self, label: Label) -> f64 {
        let predicted: usize = Label::ALL.iter().map(|&g| self.get(g, label)).sum();
        ratio(self.get(label, label), predicted)
    }

    /// Fraction of `label` documents that were predicted as such.
    pub fn recall(&self, label: Label) -> f64 {
        let gold: usize = Label::ALL.iter().map(|&p| self.get(label, p)).sum();
        ratio(self.get(label, label), gold)
    }
}

/// Result of [`VotingEnsemble::evaluate`](super::VotingEnsemble::evaluate).
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub examples: usize,
    pub members: Vec<MemberAccuracy>,
    pub ensemble_accuracy: f64,
    pub confusion: ConfusionMatrix,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_metrics() {
        let mut matrix = ConfusionMatrix::default();
        matrix.record(Label::Pos, Label::Pos);
        matrix.record(Label::Pos, Label::Pos);
        matrix.record(Label::Pos, Label::Neg);
        matrix.record(Label::Neg, Label::Neg);

        assert_eq!(matrix.total(), 4);
        assert_eq!(matrix.correct(), 3);
        assert_eq!(matrix.accuracy(), 0.75);
        assert_eq!(matrix.precision(Label::Pos), 1.0);
        assert_eq!(matrix.recall(Label::Pos), 2.0 / 3.0);
        assert_eq!(matrix.precision(Label::Neg), 0.5);
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = ConfusionMatrix::default();
        assert_eq!(matrix.accuracy(), 0.0);
        assert_eq!(matrix.recall(Label::Neg), 0.0);
    }
}
