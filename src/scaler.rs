//! Fitted standard scaler: per-feature centering and scaling.
//!
//! The scaler is a deserialized artifact; it optionally records the exact
//! feature names it was fitted on, which then become the authoritative
//! schema (see [`FeatureSchema::reconcile`](crate::data::FeatureSchema::reconcile)).

use ndarray::{Array1, ArrayView1};

use crate::data::ReferenceTable;
use crate::input::InputVector;

/// Errors raised by the scaling stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScaleError {
    #[error("scaler is not fitted")]
    NotFitted,

    #[error("feature count mismatch: scaler expects {expected}, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },
}

/// Per-feature standardization, `(x - center) / scale`.
///
/// Zero-variance features are stored with scale 1.0 at fit time, so the
/// transform is total over fitted artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    centers: Vec<f32>,
    scales: Vec<f32>,
    feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    /// Create a scaler from fitted parameters.
    pub fn new(centers: Vec<f32>, scales: Vec<f32>, feature_names: Option<Vec<String>>) -> Self {
        Self {
            centers,
            scales,
            feature_names,
        }
    }

    /// Fit a scaler on a reference table, recording its column names.
    ///
    /// Convenience for producing artifacts; the dashboard itself only
    /// ever loads an already-fitted scaler.
    pub fn fit(table: &ReferenceTable) -> Self {
        Self {
            centers: table.column_means().to_vec(),
            scales: table.column_scales().to_vec(),
            feature_names: Some(table.columns().to_vec()),
        }
    }

    /// Number of features the scaler was fitted on.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.centers.len()
    }

    /// The feature names recorded at fit time, if any.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Per-feature centers.
    pub fn centers(&self) -> &[f32] {
        &self.centers
    }

    /// Per-feature scales.
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    fn is_fitted(&self) -> bool {
        !self.centers.is_empty()
            && self.centers.len() == self.scales.len()
            && self.scales.iter().all(|s| s.is_finite() && *s > 0.0)
    }

    /// Standardize an input vector.
    ///
    /// Fails before prediction on an unfitted scaler or a feature-count
    /// mismatch; the resulting [`ScaledVector`] keeps the input's schema
    /// association (same order, same length).
    pub fn transform(&self, input: &InputVector) -> Result<ScaledVector, ScaleError> {
        if !self.is_fitted() {
            return Err(ScaleError::NotFitted);
        }
        if input.len() != self.n_features() {
            return Err(ScaleError::FeatureCountMismatch {
                expected: self.n_features(),
                got: input.len(),
            });
        }
        let values = Array1::from_iter(
            input
                .values()
                .iter()
                .zip(self.centers.iter().zip(&self.scales))
                .map(|(&x, (&c, &s))| (x - c) / s),
        );
        Ok(ScaledVector { values })
    }
}

/// An input vector after scaling; consumed by prediction and both explainers.
///
/// Only constructible through [`StandardScaler::transform`], which pins the
/// pipeline's stage ordering at the type level.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledVector {
    values: Array1<f32>,
}

impl ScaledVector {
    /// Number of features.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The scaled values in schema order.
    pub fn values(&self) -> ArrayView1<'_, f32> {
        self.values.view()
    }
}
