//! glassbox: an interactive explanation dashboard for pretrained regression models.
//!
//! Loads a serialized regression model, a fitted feature scaler, and a
//! reference dataset, then serves an interactive predict-and-explain loop:
//! each user-entered feature vector is aligned to the model's feature
//! schema, scaled, predicted, and explained twice — once with an additive
//! attribution (exact Shapley decomposition against a baseline expectation)
//! and once with a local surrogate (a weighted linear model fitted on
//! perturbed neighbors).
//!
//! # Key Types
//!
//! - [`ArtifactBundle`] - Load-once bundle of model, scaler, reference data, and schema
//! - [`Pipeline`] - Per-interaction orchestration with isolated failure domains
//! - [`AttributionExplainer`] / [`SurrogateExplainer`] - The two explanation mechanisms
//! - [`RegressionModel`] - Tree-ensemble and linear regression models
//!
//! # Pipeline
//!
//! Build an [`InputVector`] from user values, then `Pipeline::run()`.
//! See the [`pipeline`] module for the stage-by-stage contract.
//!
//! # Artifacts
//!
//! Models and scalers are stored in the native `.gbx` format (checksummed
//! header plus Postcard payload); the reference dataset is a Parquet table.
//! See the [`artifacts`] module for details.

// Re-export approx traits for users who want to compare attributions
pub use approx;

pub mod artifacts;
pub mod data;
pub mod explain;
pub mod input;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod scaler;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Artifact loading
pub use artifacts::{ArtifactBundle, ArtifactError};

// Data types
pub use data::{FeatureSchema, ReferenceTable};

// Explanation types
pub use explain::{
    Attribution, AttributionError, AttributionExplainer, SurrogateConfig, SurrogateError,
    SurrogateExplainer, SurrogateReport,
};

// Input assembly
pub use input::{InputError, InputVector};

// Models
pub use model::{LinearModel, PredictError, RegressionModel, TreeModel};

// Pipeline orchestration
pub use pipeline::{InteractionReport, Pipeline, PipelineError};

// Scaling
pub use scaler::{ScaledVector, ScaleError, StandardScaler};
