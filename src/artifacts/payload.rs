//! Payload structures for the native artifact format.
//!
//! These structs are designed for serialization with Postcard. They mirror
//! the runtime types but are optimized for compact binary storage.

use serde::{Deserialize, Serialize};

use crate::model::{LinearModel, RegressionModel, Tree, TreeModel, TreeValidationError};
use crate::scaler::StandardScaler;

// ============================================================================
// Top-Level Payload
// ============================================================================

/// Version-tagged payload enum for forward compatibility.
///
/// New format versions add new variants rather than modifying existing
/// ones; older readers detect unsupported versions by the discriminant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    /// Version 1 payload format.
    V1(PayloadV1),
}

/// Version 1 payload structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadV1 {
    /// The artifact carried by this file.
    pub artifact: ArtifactPayload,
}

/// Artifact-specific payload variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArtifactPayload {
    /// Regression model payload.
    Model(ModelPayload),
    /// Fitted scaler payload.
    Scaler(ScalerPayload),
}

// ============================================================================
// Model Payloads
// ============================================================================

/// Serialized regression model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPayload {
    /// Number of input features.
    pub n_features: u32,
    /// Model-kind specific data.
    pub kind: ModelKindPayload,
}

/// Model-kind payload variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelKindPayload {
    /// Tree ensemble.
    Tree(TreeEnsemblePayload),
    /// Linear model.
    Linear(LinearPayload),
}

/// Tree ensemble payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemblePayload {
    /// Base score added to every prediction.
    pub base_score: f32,
    /// Individual tree payloads.
    pub trees: Vec<TreePayload>,
}

/// Single regression tree payload (parallel node arrays).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreePayload {
    /// Split feature indices (one per node).
    pub split_features: Vec<u32>,
    /// Split thresholds (one per node, 0.0 for leaves).
    pub thresholds: Vec<f32>,
    /// Left child indices (one per node, 0 for leaves).
    pub left_children: Vec<u32>,
    /// Right child indices (one per node, 0 for leaves).
    pub right_children: Vec<u32>,
    /// Default direction for missing values (one per node).
    pub default_left: Vec<bool>,
    /// Whether each node is a leaf.
    pub is_leaf: Vec<bool>,
    /// Leaf values (one per node, 0.0 for internal nodes).
    pub leaf_values: Vec<f32>,
    /// Optional: cover/sample-weight sum at each node (for attribution).
    pub covers: Option<Vec<f32>>,
}

/// Linear model payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearPayload {
    /// Per-feature weights.
    pub weights: Vec<f32>,
    /// Bias term.
    pub bias: f32,
}

// ============================================================================
// Scaler Payload
// ============================================================================

/// Fitted standard scaler payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerPayload {
    /// Per-feature centers (means at fit time).
    pub centers: Vec<f32>,
    /// Per-feature scales (standard deviations at fit time).
    pub scales: Vec<f32>,
    /// Feature names recorded at fit time, if any.
    pub feature_names: Option<Vec<String>>,
}

// ============================================================================
// Runtime Conversions
// ============================================================================

impl From<&Tree> for TreePayload {
    fn from(tree: &Tree) -> Self {
        let n = tree.n_nodes() as u32;
        Self {
            split_features: (0..n).map(|i| tree.split_feature(i)).collect(),
            thresholds: (0..n).map(|i| tree.threshold(i)).collect(),
            left_children: (0..n).map(|i| tree.left_child(i)).collect(),
            right_children: (0..n).map(|i| tree.right_child(i)).collect(),
            default_left: (0..n).map(|i| tree.default_left(i)).collect(),
            is_leaf: (0..n).map(|i| tree.is_leaf(i)).collect(),
            leaf_values: (0..n).map(|i| tree.leaf_value(i)).collect(),
            covers: tree.covers().map(<[f32]>::to_vec),
        }
    }
}

impl From<TreePayload> for Tree {
    fn from(p: TreePayload) -> Self {
        Tree::new(
            p.split_features,
            p.thresholds,
            p.left_children,
            p.right_children,
            p.default_left,
            p.is_leaf,
            p.leaf_values,
            p.covers,
        )
    }
}

impl From<&RegressionModel> for ModelPayload {
    fn from(model: &RegressionModel) -> Self {
        match model {
            RegressionModel::Tree(m) => Self {
                n_features: m.n_features() as u32,
                kind: ModelKindPayload::Tree(TreeEnsemblePayload {
                    base_score: m.base_score(),
                    trees: m.trees().iter().map(TreePayload::from).collect(),
                }),
            },
            RegressionModel::Linear(m) => Self {
                n_features: m.n_features() as u32,
                kind: ModelKindPayload::Linear(LinearPayload {
                    weights: m.weights().to_vec(),
                    bias: m.bias(),
                }),
            },
        }
    }
}

impl TryFrom<ModelPayload> for RegressionModel {
    type Error = TreeValidationError;

    fn try_from(p: ModelPayload) -> Result<Self, Self::Error> {
        let n_features = p.n_features as usize;
        match p.kind {
            ModelKindPayload::Tree(ensemble) => {
                let trees: Vec<Tree> = ensemble.trees.into_iter().map(Tree::from).collect();
                let model = TreeModel::new(trees, ensemble.base_score, n_features);
                model.validate()?;
                Ok(Self::Tree(model))
            }
            ModelKindPayload::Linear(linear) => {
                Ok(Self::Linear(LinearModel::new(linear.weights, linear.bias)))
            }
        }
    }
}

impl From<&StandardScaler> for ScalerPayload {
    fn from(scaler: &StandardScaler) -> Self {
        Self {
            centers: scaler.centers().to_vec(),
            scales: scaler.scales().to_vec(),
            feature_names: scaler.feature_names().map(<[String]>::to_vec),
        }
    }
}

impl From<ScalerPayload> for StandardScaler {
    fn from(p: ScalerPayload) -> Self {
        StandardScaler::new(p.centers, p.scales, p.feature_names)
    }
}

// ============================================================================
// Tests
// ============================================================================
