//! Path-dependent TreeSHAP for tree ensembles.
//!
//! Implements the polynomial-time algorithm from Lundberg et al. (2020):
//! "From local explanations to global understanding with explainable AI
//! for trees". Cover statistics stored in the model artifact stand in for
//! the training distribution, so the baseline is the cover-weighted
//! expectation of each tree.

use ndarray::ArrayView1;

use super::path::PathState;
use super::{Attribution, AttributionError};
use crate::model::{Tree, TreeModel};

/// TreeSHAP explainer for tree ensembles.
///
/// Computes exact Shapley contributions per tree and sums them; the
/// ensemble's base value is the base score plus each tree's expected
/// value under its covers.
pub struct TreeShapExplainer<'a> {
    model: &'a TreeModel,
    base_value: f64,
}

impl<'a> TreeShapExplainer<'a> {
    /// Create an explainer for the given ensemble.
    ///
    /// # Errors
    /// Returns [`AttributionError::MissingNodeStats`] if any tree lacks
    /// cover statistics.
    pub fn new(model: &'a TreeModel) -> Result<Self, AttributionError> {
        let mut base_value = model.base_score() as f64;
        for tree in model.trees() {
            base_value += tree
                .expected_value()
                .ok_or(AttributionError::MissingNodeStats)?;
        }
        Ok(Self { model, base_value })
    }

    /// The baseline expectation (base score plus per-tree expectations).
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// Compute contributions for a single scaled instance.
    pub fn explain(&self, instance: ArrayView1<'_, f32>) -> Result<Attribution, AttributionError> {
        let n_features = self.model.n_features();
        if instance.len() != n_features {
            return Err(AttributionError::FeatureCountMismatch {
                expected: n_features,
                got: instance.len(),
            });
        }

        let mut phi = vec![0.0f64; n_features];
        for tree in self.model.trees() {
            let path = PathState::new(tree.max_depth() + 1);
            self.recurse(tree, instance, &mut phi, 0, path, 1.0, 1.0, -1);
        }
        Ok(Attribution::new(phi, self.base_value))
    }

    /// Recursive descent carrying the weighted path state.
    #[allow(clippy::too_many_arguments)]
    fn recurse(
        &self,
        tree: &Tree,
        instance: ArrayView1<'_, f32>,
        phi: &mut [f64],
        node: u32,
        mut path: PathState,
        parent_zero_fraction: f64,
        parent_one_fraction: f64,
        parent_feature: i32,
    ) {
        path.extend(parent_zero_fraction, parent_one_fraction, parent_feature);

        if tree.is_leaf(node) {
            let leaf_value = tree.leaf_value(node) as f64;
            for i in 1..path.len() {
                let el = *path.element(i);
                let w = path.unwound_sum(i);
                phi[el.feature as usize] += w * (el.one_fraction - el.zero_fraction) * leaf_value;
            }
            return;
        }

        // Constructor guarantees covers are present.
        let covers = tree.covers().unwrap();

        let feature = tree.split_feature(node);
        let left = tree.left_child(node);
        let right = tree.right_child(node);

        let value = instance[feature as usize];
        let go_left = if value.is_nan() {
            tree.default_left(node)
        } else {
            value < tree.threshold(node)
        };
        let (hot, cold) = if go_left { (left, right) } else { (right, left) };

        let node_cover = covers[node as usize] as f64;
        let hot_zero_fraction = covers[hot as usize] as f64 / node_cover;
        let cold_zero_fraction = covers[cold as usize] as f64 / node_cover;

        // A feature revisited along the path folds its previous fractions
        // into the new ones and leaves the path.
        let mut incoming_zero_fraction = 1.0;
        let mut incoming_one_fraction = 1.0;
        if let Some(prior) = path.find(feature as i32) {
            incoming_zero_fraction = path.element(prior).zero_fraction;
            incoming_one_fraction = path.element(prior).one_fraction;
            path.unwind(prior);
        }

        self.recurse(
            tree,
            instance,
            phi,
            hot,
            path.clone(),
            hot_zero_fraction * incoming_zero_fraction,
            incoming_one_fraction,
            feature as i32,
        );
        self.recurse(
            tree,
            instance,
            phi,
            cold,
            path,
            cold_zero_fraction * incoming_zero_fraction,
            0.0,
            feature as i32,
        );
    }
}
