//! Linear regression model: weights plus bias.

use ndarray::ArrayView1;

/// A fitted linear model, `y = w · x + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    weights: Vec<f32>,
    bias: f32,
}

impl LinearModel {
    /// Create a model from per-feature weights and a bias term.
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }

    /// Number of input features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Per-feature weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Bias term.
    #[inline]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Predict one row.
    pub fn predict_row(&self, row: ArrayView1<'_, f32>) -> f32 {
        let mut acc = self.bias;
        for (w, x) in self.weights.iter().zip(row.iter()) {
            acc += w * x;
        }
        acc
    }
}
