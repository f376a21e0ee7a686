//! Post-hoc explanation of individual predictions.
//!
//! Two independent mechanisms, with isolated failure domains:
//!
//! - **Additive attribution** ([`AttributionExplainer`]): exact Shapley
//!   decomposition of one prediction against a baseline expectation.
//!   Tree models use the path-dependent TreeSHAP algorithm over cover
//!   statistics; linear models have a closed-form solution.
//! - **Local surrogate** ([`SurrogateExplainer`]): a weighted linear model
//!   fitted on perturbed neighbors of the instance, yielding per-feature
//!   local weights valid only around that instance.

mod attribution;
mod linear_shap;
mod path;
mod surrogate;
mod tree_shap;

pub use attribution::Attribution;
pub use linear_shap::LinearShapExplainer;
pub use path::PathState;
pub use surrogate::{SurrogateConfig, SurrogateError, SurrogateExplainer, SurrogateReport};
pub use tree_shap::TreeShapExplainer;

use ndarray::ArrayView1;

use crate::data::ReferenceTable;
use crate::model::RegressionModel;

/// Errors raised by the attribution explainer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributionError {
    #[error("tree model lacks the cover statistics required for attribution")]
    MissingNodeStats,

    #[error("feature count mismatch: explainer expects {expected}, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },
}

/// Additive attribution explainer, dispatched by model kind.
///
/// Bound once to `{model, reference dataset}`; each [`explain`](Self::explain)
/// call is independent and takes the instance as an argument.
pub enum AttributionExplainer<'a> {
    /// Path-dependent TreeSHAP over a tree ensemble.
    Tree(TreeShapExplainer<'a>),
    /// Closed-form SHAP for a linear model.
    Linear(LinearShapExplainer<'a>),
}

impl<'a> AttributionExplainer<'a> {
    /// Construct the explainer for the given model.
    ///
    /// Tree models must carry cover statistics; linear models take their
    /// baseline from the reference table's column means.
    pub fn new(
        model: &'a RegressionModel,
        reference: &'a ReferenceTable,
    ) -> Result<Self, AttributionError> {
        match model {
            RegressionModel::Tree(m) => TreeShapExplainer::new(m).map(Self::Tree),
            RegressionModel::Linear(m) => {
                LinearShapExplainer::new(m, reference).map(Self::Linear)
            }
        }
    }

    /// The baseline expectation contributions are measured against.
    pub fn base_value(&self) -> f64 {
        match self {
            Self::Tree(e) => e.base_value(),
            Self::Linear(e) => e.base_value(),
        }
    }

    /// Decompose one scaled instance into per-feature contributions.
    pub fn explain(&self, instance: ArrayView1<'_, f32>) -> Result<Attribution, AttributionError> {
        match self {
            Self::Tree(e) => e.explain(instance),
            Self::Linear(e) => e.explain(instance),
        }
    }
}
