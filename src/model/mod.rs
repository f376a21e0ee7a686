//! Regression model representations.
//!
//! Two model kinds cover the artifact formats the dashboard loads:
//!
//! - [`TreeModel`]: a tree ensemble with SoA node storage and NaN-aware
//!   traversal, carrying optional per-node cover statistics
//! - [`LinearModel`]: weights plus bias
//!
//! Both expose the single contract the pipeline needs: one scalar
//! prediction per schema-aligned row.

mod linear;
mod tree;

pub use linear::LinearModel;
pub use tree::{Tree, TreeModel, TreeValidationError};

use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

/// Errors raised by prediction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    #[error("feature count mismatch: model expects {expected}, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },

    #[error("model produced a non-finite prediction")]
    NonFinite,
}

/// A pretrained single-output regression model.
#[derive(Debug, Clone)]
pub enum RegressionModel {
    /// Tree ensemble.
    Tree(TreeModel),
    /// Linear model.
    Linear(LinearModel),
}

impl RegressionModel {
    /// Number of input features the model was trained on.
    pub fn n_features(&self) -> usize {
        match self {
            Self::Tree(m) => m.n_features(),
            Self::Linear(m) => m.n_features(),
        }
    }

    /// Predict a single schema-aligned row.
    pub fn predict_row(&self, row: ArrayView1<'_, f32>) -> Result<f32, PredictError> {
        if row.len() != self.n_features() {
            return Err(PredictError::FeatureCountMismatch {
                expected: self.n_features(),
                got: row.len(),
            });
        }
        let value = match self {
            Self::Tree(m) => m.predict_row(row),
            Self::Linear(m) => m.predict_row(row),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(PredictError::NonFinite)
        }
    }

    /// Predict a batch of rows, `[n_rows, n_features]`.
    ///
    /// Rows are independent; the batch fans out over rayon. Used by the
    /// surrogate explainer for its perturbation sample.
    pub fn predict_batch(&self, rows: ArrayView2<'_, f32>) -> Result<Vec<f32>, PredictError> {
        (0..rows.nrows())
            .into_par_iter()
            .map(|i| self.predict_row(rows.row(i)))
            .collect()
    }
}
