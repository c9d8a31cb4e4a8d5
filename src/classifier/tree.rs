//! CART decision tree on binary features.

use serde::{Deserialize, Serialize};

use crate::classifier::{
    AlgorithmId, Estimator, ModelKind, ModelMetadata, SentimentModel, TrainedModel, TrainingData,
};
use crate::corpus::Label;
use crate::error::Result;

/// Tree node. Children are indices into [`DecisionTree::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf(Label),
    Split {
        feature: usize,
        absent: usize,
        present: usize,
    },
}

/// Fitted tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path, counted in splits.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], i: usize) -> usize {
            match nodes[i] {
                Node::Leaf(_) => 0,
                Node::Split {
                    absent, present, ..
                } => 1 + walk(nodes, absent).max(walk(nodes, present)),
            }
        }
        walk(&self.nodes, 0)
    }
}

impl SentimentModel for DecisionTree {
    fn classify_active(&self, active: &[usize]) -> Label {
        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(Node::Leaf(label)) => return *label,
                Some(Node::Split {
                    feature,
                    absent,
                    present,
                }) => {
                    i = if active.binary_search(feature).is_ok() {
                        *present
                    } else {
                        *absent
                    };
                }
                None => return Label::Pos,
            }
        }
    }
}

/// Gini impurity of a two-class count.
fn gini(counts: [usize; 2]) -> f64 {
    let total = (counts[0] + counts[1]) as f64;
    if total == 0.0 {
        return 0.0;
    }
    2.0 * (counts[0] * counts[1]) as f64 / (total * total)
}

/// Majority label; ties go to the positive label.
fn majority(counts: [usize; 2]) -> Label {
    if counts[Label::Neg.index()] > counts[Label::Pos.index()] {
        Label::Neg
    } else {
        Label::Pos
    }
}

/// Greedy CART with the Gini criterion.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    pub max_depth: usize,
    /// Nodes with fewer samples become leaves.
    pub min_samples_split: usize,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self {
            max_depth: 24,
            min_samples_split: 2,
        }
    }
}

struct Builder<'a> {
    data: &'a TrainingData,
    max_depth: usize,
    min_samples_split: usize,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn counts(&self, samples: &[usize]) -> [usize; 2] {
        let mut counts = [0; 2];
        for &i in samples {
            counts[self.data.labels()[i].index()] += 1;
        }
        counts
    }

    /// Feature with the lowest weighted child impurity, if it improves on the
    /// parent. Ties go to the lowest feature index.
    fn best_split(&self, samples: &[usize], parent: [usize; 2]) -> Option<usize> {
        let n_features = self.data.n_features();
        let mut present = vec![[0usize; 2]; n_features];
        for &i in samples {
            let c = self.data.labels()[i].index();
            for &j in &self.data.rows()[i] {
                if j < n_features {
                    present[j][c] += 1;
                }
            }
        }

        let total = samples.len() as f64;
        let mut best: Option<(usize, f64)> = None;
        for (feature, with) in present.iter().enumerate() {
            let with = *with;
            let without = [parent[0] - with[0], parent[1] - with[1]];
            let n_with = (with[0] + with[1]) as f64;
            if n_with == 0.0 || n_with == total {
                continue;
            }
            let impurity = (n_with * gini(with) + (total - n_with) * gini(without)) / total;
            if best.is_none_or(|(_, b)| impurity < b) {
                best = Some((feature, impurity));
            }
        }

        best.filter(|(_, impurity)| *impurity < gini(parent) - 1e-12)
            .map(|(feature, _)| feature)
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.counts(&samples);
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf(majority(counts)));

        if depth >= self.max_depth
            || samples.len() < self.min_samples_split
            || counts[0] == 0
            || counts[1] == 0
        {
            return index;
        }

        let Some(feature) = self.best_split(&samples, counts) else {
            return index;
        };

        let (with, without): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.data.rows()[i].contains(&feature));

        let absent = self.grow(without, depth + 1);
        let present = self.grow(with, depth + 1);
        self.nodes[index] = Node::Split {
            feature,
            absent,
            present,
        };
        index
    }
}

impl Estimator for DecisionTreeClassifier {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::DecisionTree
    }

    fn fit(&self, data: &TrainingData) -> Result<TrainedModel> {
        data.require_examples(self.algorithm())?;
        let mut builder = Builder {
            data,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            nodes: Vec::new(),
        };
        builder.grow((0..data.len()).collect(), 0);
        let tree = DecisionTree {
            nodes: builder.nodes,
        };

        let metadata = ModelMetadata::new(self.algorithm(), data)
            .with_hyperparameter("max_depth", self.max_depth as f64)
            .with_hyperparameter("min_samples_split", self.min_samples_split as f64)
            .with_hyperparameter("node_count", tree.node_count() as f64);
        Ok(TrainedModel::new(metadata, ModelKind::DecisionTree(tree)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::{assert_handles_degenerate, assert_learns_separable, separable};

    fn tree(model: &TrainedModel) -> &DecisionTree {
        match model.kind() {
            ModelKind::DecisionTree(tree) => tree,
            _ => panic!("not a tree"),
        }
    }

    #[test]
    fn test_tree_learns() {
        assert_learns_separable(&DecisionTreeClassifier::default());
        assert_handles_degenerate(&DecisionTreeClassifier::default());
    }

    #[test]
    fn test_training_set_is_fit_exactly() {
        let data = separable();
        let model = DecisionTreeClassifier::default().fit(&data).unwrap();
        for (active, label) in data.iter() {
            assert_eq!(model.classify_active(active), label);
        }
        assert_eq!(tree(&model).nodes[0], Node::Split {
            feature: 0,
            absent: 1,
            present: tree(&model).node_count() - 1,
        });
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let estimator = DecisionTreeClassifier {
            max_depth: 1,
            ..Default::default()
        };
        let model = estimator.fit(&separable()).unwrap();
        assert_eq!(tree(&model).depth(), 1);
        assert_eq!(tree(&model).node_count(), 3);
    }

    #[test]
    fn test_pure_data_is_a_single_leaf() {
        let data = TrainingData::from_rows(vec![vec![0], vec![1]], vec![Label::Neg; 2], 2);
        let model = DecisionTreeClassifier::default().fit(&data).unwrap();
        assert_eq!(tree(&model).nodes, vec![Node::Leaf(Label::Neg)]);
    }
}
