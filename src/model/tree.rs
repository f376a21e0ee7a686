//! Tree ensemble representation (SoA) and traversal.

use ndarray::ArrayView1;

/// Structural validation errors for a deserialized tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    #[error("node arrays have inconsistent lengths")]
    InconsistentArrays,

    #[error("tree has no nodes")]
    EmptyTree,

    #[error("node {node} references child {child} outside the tree")]
    ChildOutOfRange { node: u32, child: u32 },

    #[error("node {node} splits on feature {feature}, but the model has {n_features} features")]
    FeatureOutOfRange {
        node: u32,
        feature: u32,
        n_features: usize,
    },

    #[error("cover array length {got} does not match node count {expected}")]
    CoverLengthMismatch { expected: usize, got: usize },
}

/// A single regression tree in structure-of-arrays layout.
///
/// Node 0 is the root. Leaves carry values; internal nodes carry a numeric
/// split `feature < threshold` with a default direction for NaN inputs.
/// Covers (per-node training-sample weights) are optional; the attribution
/// explainer requires them.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_features: Vec<u32>,
    thresholds: Vec<f32>,
    left_children: Vec<u32>,
    right_children: Vec<u32>,
    default_left: Vec<bool>,
    is_leaf: Vec<bool>,
    leaf_values: Vec<f32>,
    covers: Option<Vec<f32>>,
}

impl Tree {
    /// Create a tree from parallel node arrays.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        split_features: Vec<u32>,
        thresholds: Vec<f32>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        default_left: Vec<bool>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f32>,
        covers: Option<Vec<f32>>,
    ) -> Self {
        Self {
            split_features,
            thresholds,
            left_children,
            right_children,
            default_left,
            is_leaf,
            leaf_values,
            covers,
        }
    }

    /// A depth-1 tree: `feature < threshold` -> `left_value` else `right_value`.
    ///
    /// Covers are `[left_cover + right_cover, left_cover, right_cover]`.
    pub fn stump(
        feature: u32,
        threshold: f32,
        left_value: f32,
        right_value: f32,
        left_cover: f32,
        right_cover: f32,
    ) -> Self {
        Self::new(
            vec![feature, 0, 0],
            vec![threshold, 0.0, 0.0],
            vec![1, 0, 0],
            vec![2, 0, 0],
            vec![true, false, false],
            vec![false, true, true],
            vec![0.0, left_value, right_value],
            Some(vec![left_cover + right_cover, left_cover, right_cover]),
        )
    }

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    /// Whether a node is a leaf.
    #[inline]
    pub fn is_leaf(&self, node: u32) -> bool {
        self.is_leaf[node as usize]
    }

    /// Split feature of an internal node.
    #[inline]
    pub fn split_feature(&self, node: u32) -> u32 {
        self.split_features[node as usize]
    }

    /// Split threshold of an internal node.
    #[inline]
    pub fn threshold(&self, node: u32) -> f32 {
        self.thresholds[node as usize]
    }

    /// Left child of an internal node.
    #[inline]
    pub fn left_child(&self, node: u32) -> u32 {
        self.left_children[node as usize]
    }

    /// Right child of an internal node.
    #[inline]
    pub fn right_child(&self, node: u32) -> u32 {
        self.right_children[node as usize]
    }

    /// Default direction for NaN inputs at an internal node.
    #[inline]
    pub fn default_left(&self, node: u32) -> bool {
        self.default_left[node as usize]
    }

    /// Leaf value at a leaf node.
    #[inline]
    pub fn leaf_value(&self, node: u32) -> f32 {
        self.leaf_values[node as usize]
    }

    /// Per-node covers, if the artifact carries them.
    pub fn covers(&self) -> Option<&[f32]> {
        self.covers.as_deref()
    }

    /// Whether cover statistics are available.
    pub fn has_covers(&self) -> bool {
        self.covers.is_some()
    }

    /// Drop cover statistics. Test hook for exercising attribution failure.
    pub fn without_covers(mut self) -> Self {
        self.covers = None;
        self
    }

    /// Traverse from the root to a leaf and return its value.
    pub fn predict_row(&self, row: ArrayView1<'_, f32>) -> f32 {
        let mut node = 0u32;
        while !self.is_leaf(node) {
            let value = row[self.split_feature(node) as usize];
            let go_left = if value.is_nan() {
                self.default_left(node)
            } else {
                value < self.threshold(node)
            };
            node = if go_left {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }
        self.leaf_value(node)
    }

    /// Maximum root-to-leaf depth (a stump has depth 1).
    pub fn max_depth(&self) -> usize {
        self.depth_below(0)
    }

    fn depth_below(&self, node: u32) -> usize {
        if self.is_leaf(node) {
            1
        } else {
            1 + self
                .depth_below(self.left_child(node))
                .max(self.depth_below(self.right_child(node)))
        }
    }

    /// Cover-weighted mean of leaf values: the tree's expected prediction
    /// under the training distribution. `None` without covers.
    pub fn expected_value(&self) -> Option<f64> {
        let covers = self.covers.as_deref()?;
        let mut weighted = 0.0f64;
        let mut total = 0.0f64;
        for node in 0..self.n_nodes() {
            if self.is_leaf[node] {
                weighted += self.leaf_values[node] as f64 * covers[node] as f64;
                total += covers[node] as f64;
            }
        }
        if total > 0.0 {
            Some(weighted / total)
        } else {
            None
        }
    }

    /// Check structural consistency against the model's feature count.
    pub fn validate(&self, n_features: usize) -> Result<(), TreeValidationError> {
        let n = self.n_nodes();
        if n == 0 {
            return Err(TreeValidationError::EmptyTree);
        }
        if self.split_features.len() != n
            || self.thresholds.len() != n
            || self.left_children.len() != n
            || self.right_children.len() != n
            || self.default_left.len() != n
            || self.leaf_values.len() != n
        {
            return Err(TreeValidationError::InconsistentArrays);
        }
        if let Some(covers) = &self.covers {
            if covers.len() != n {
                return Err(TreeValidationError::CoverLengthMismatch {
                    expected: n,
                    got: covers.len(),
                });
            }
        }
        for node in 0..n as u32 {
            if self.is_leaf(node) {
                continue;
            }
            for child in [self.left_child(node), self.right_child(node)] {
                if child as usize >= n {
                    return Err(TreeValidationError::ChildOutOfRange { node, child });
                }
            }
            let feature = self.split_feature(node);
            if feature as usize >= n_features {
                return Err(TreeValidationError::FeatureOutOfRange {
                    node,
                    feature,
                    n_features,
                });
            }
        }
        Ok(())
    }
}

/// A tree ensemble: sum of tree outputs plus a base score.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeModel {
    trees: Vec<Tree>,
    base_score: f32,
    n_features: usize,
}

impl TreeModel {
    /// Create an ensemble from its trees.
    pub fn new(trees: Vec<Tree>, base_score: f32, n_features: usize) -> Self {
        Self {
            trees,
            base_score,
            n_features,
        }
    }

    /// Number of input features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Base score added to every prediction.
    #[inline]
    pub fn base_score(&self) -> f32 {
        self.base_score
    }

    /// The trees in boosting order.
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Whether every tree carries cover statistics.
    pub fn has_covers(&self) -> bool {
        self.trees.iter().all(Tree::has_covers)
    }

    /// Predict one row: base score plus the sum of tree outputs.
    pub fn predict_row(&self, row: ArrayView1<'_, f32>) -> f32 {
        let mut acc = self.base_score;
        for tree in &self.trees {
            acc += tree.predict_row(row);
        }
        acc
    }

    /// Validate every tree against the feature count.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        for tree in &self.trees {
            tree.validate(self.n_features)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn stump_traversal() {
        let tree = Tree::stump(0, 0.5, -1.0, 1.0, 60.0, 40.0);
        assert_eq!(tree.predict_row(array![0.3f32, 9.9].view()), -1.0);
        assert_eq!(tree.predict_row(array![0.7f32, 9.9].view()), 1.0);
    }

    #[test]
    fn nan_follows_default_direction() {
        let tree = Tree::stump(0, 0.5, -1.0, 1.0, 60.0, 40.0);
        assert_eq!(tree.predict_row(array![f32::NAN, 0.0].view()), -1.0);
    }

    #[test]
    fn ensemble_sums_trees_and_base() {
        let model = TreeModel::new(
            vec![
                Tree::stump(0, 0.5, -1.0, 1.0, 50.0, 50.0),
                Tree::stump(1, 2.0, 0.25, 0.75, 50.0, 50.0),
            ],
            10.0,
            2,
        );
        // x = [0.3, 5.0]: left (-1.0) + right (0.75) + base 10.0
        assert_abs_diff_eq!(
            model.predict_row(array![0.3f32, 5.0].view()),
            9.75,
            epsilon = 1e-6
        );
    }

    #[test]
    fn expected_value_is_cover_weighted() {
        let tree = Tree::stump(0, 0.5, -1.0, 1.0, 75.0, 25.0);
        // (-1 * 75 + 1 * 25) / 100
        assert_abs_diff_eq!(tree.expected_value().unwrap(), -0.5, epsilon = 1e-12);
        assert_eq!(tree.without_covers().expected_value(), None);
    }

    #[test]
    fn max_depth() {
        let stump = Tree::stump(0, 0.5, -1.0, 1.0, 1.0, 1.0);
        assert_eq!(stump.max_depth(), 2);
    }

    #[test]
    fn validate_catches_out_of_range_child() {
        let tree = Tree::new(
            vec![0],
            vec![0.5],
            vec![7],
            vec![8],
            vec![true],
            vec![false],
            vec![0.0],
            None,
        );
        assert_eq!(
            tree.validate(1),
            Err(TreeValidationError::ChildOutOfRange { node: 0, child: 7 })
        );
    }

    #[test]
    fn validate_catches_out_of_range_feature() {
        let tree = Tree::stump(5, 0.5, -1.0, 1.0, 1.0, 1.0);
        assert!(matches!(
            tree.validate(2),
            Err(TreeValidationError::FeatureOutOfRange { feature: 5, .. })
        ));
    }

    #[test]
    fn validate_accepts_stump() {
        let tree = Tree::stump(0, 0.5, -1.0, 1.0, 1.0, 1.0);
        assert_eq!(tree.validate(1), Ok(()));
    }
}
