use serde::{Deserialize, Serialize};

/// Feature index marking a leaf node.
pub const TREE_UNDEFINED: i64 = -2;

/// Child index of a leaf node.
pub const TREE_LEAF: i64 = -1;

/// A fitted binary decision tree stored as parallel arrays indexed by node id.
/// Node 0 is the root. The left child of a split holds samples with
/// `x[feature] <= threshold`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DecisionTree {
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    /// Per-class scores, only meaningful at leaves.
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    pub fn node_count(&self) -> usize {
        self.feature.len()
    }

    /// Whether `node` is a leaf, or `None` when the id is out of range.
    pub fn is_leaf(&self, node: usize) -> Option<bool> {
        self.feature.get(node).map(|&f| f == TREE_UNDEFINED)
    }

    /// Build a tree from `(feature, threshold, left, right, value)` rows.
    pub fn from_nodes(nodes: Vec<(i64, f64, i64, i64, Vec<f64>)>) -> Self {
        let mut tree = DecisionTree {
            feature: Vec::with_capacity(nodes.len()),
            threshold: Vec::with_capacity(nodes.len()),
            children_left: Vec::with_capacity(nodes.len()),
            children_right: Vec::with_capacity(nodes.len()),
            value: Vec::with_capacity(nodes.len()),
        };
        for (feature, threshold, left, right, value) in nodes {
            tree.feature.push(feature);
            tree.threshold.push(threshold);
            tree.children_left.push(left);
            tree.children_right.push(right);
            tree.value.push(value);
        }
        tree
    }
}

/// Index of the largest score. Ties go to the lowest index; `None` for an
/// empty slice or when any score is NaN.
pub fn argmax(values: &[f64]) -> Option<usize> {
    if values.iter().any(|v| v.is_nan()) {
        return None;
    }
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some(b) if v <= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}
