//! Closed-form SHAP for linear models.
//!
//! Contributions have an exact solution: `shap[i] = w[i] * (x[i] - mean[i])`,
//! with the baseline `E[f(x)] = w · mean + bias` taken over the reference
//! table's column means.

use ndarray::ArrayView1;

use super::{Attribution, AttributionError};
use crate::data::ReferenceTable;
use crate::model::LinearModel;

/// Closed-form SHAP explainer for linear models.
pub struct LinearShapExplainer<'a> {
    model: &'a LinearModel,
    means: Vec<f64>,
    base_value: f64,
}

impl<'a> LinearShapExplainer<'a> {
    /// Create an explainer with the reference table as background.
    ///
    /// # Errors
    /// Returns an error if the table's width doesn't match the model.
    pub fn new(
        model: &'a LinearModel,
        reference: &'a ReferenceTable,
    ) -> Result<Self, AttributionError> {
        if reference.n_features() != model.n_features() {
            return Err(AttributionError::FeatureCountMismatch {
                expected: model.n_features(),
                got: reference.n_features(),
            });
        }
        let means: Vec<f64> = reference.column_means().iter().map(|&m| m as f64).collect();
        let mut base_value = model.bias() as f64;
        for (w, mean) in model.weights().iter().zip(&means) {
            base_value += *w as f64 * mean;
        }
        Ok(Self {
            model,
            means,
            base_value,
        })
    }

    /// The baseline expectation `w · mean + bias`.
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// Compute contributions for a single scaled instance.
    pub fn explain(&self, instance: ArrayView1<'_, f32>) -> Result<Attribution, AttributionError> {
        if instance.len() != self.model.n_features() {
            return Err(AttributionError::FeatureCountMismatch {
                expected: self.model.n_features(),
                got: instance.len(),
            });
        }
        let contributions = self
            .model
            .weights()
            .iter()
            .zip(instance.iter())
            .zip(&self.means)
            .map(|((&w, &x), &mean)| w as f64 * (x as f64 - mean))
            .collect();
        Ok(Attribution::new(contributions, self.base_value))
    }
}
