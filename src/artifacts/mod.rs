//! Artifact bundle: load-once deserialization of everything the pipeline needs.
//!
//! The bundle is created at process start and shared by reference into
//! every interaction; nothing in it is mutated afterwards. Loading either
//! yields a complete bundle or fails — no partial initialization is ever
//! exposed.

pub mod codec;
pub mod payload;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::io::{load_reference_table, TableLoadError};
use crate::data::{FeatureSchema, ReferenceTable, SchemaMismatch};
use crate::model::RegressionModel;
use crate::scaler::StandardScaler;

pub use codec::{DecodeError, EncodeError};

/// Model artifact file name.
pub const MODEL_FILE: &str = "model.gbx";

/// Scaler artifact file name.
pub const SCALER_FILE: &str = "scaler.gbx";

/// Reference dataset file name.
pub const REFERENCE_FILE: &str = "reference.parquet";

/// Feature-name list file name.
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";

/// Errors that abort bundle initialization.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("missing artifact file: {0}")]
    Missing(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode {file}: {source}")]
    Decode {
        file: &'static str,
        source: DecodeError,
    },

    #[error("failed to parse feature names: {0}")]
    FeatureNames(#[from] serde_json::Error),

    #[error("failed to load reference table: {0}")]
    Reference(#[from] TableLoadError),

    #[error(transparent)]
    Schema(#[from] SchemaMismatch),
}

/// The immutable set of loaded artifacts.
///
/// Feature-name resolution happens here: if the scaler recorded the names
/// it was fitted on, those override the external list, and the reference
/// table is realigned to the resolved schema before anything else sees it.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    model: RegressionModel,
    scaler: StandardScaler,
    reference: ReferenceTable,
    schema: FeatureSchema,
}

impl ArtifactBundle {
    /// Load all artifacts from a directory.
    ///
    /// Expects [`MODEL_FILE`], [`SCALER_FILE`], [`REFERENCE_FILE`], and
    /// [`FEATURE_NAMES_FILE`] to be present; the first absent file aborts
    /// the load with [`ArtifactError::Missing`].
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let dir = dir.as_ref();
        let start = Instant::now();

        let model_path = required(dir, MODEL_FILE)?;
        let scaler_path = required(dir, SCALER_FILE)?;
        let reference_path = required(dir, REFERENCE_FILE)?;
        let names_path = required(dir, FEATURE_NAMES_FILE)?;

        let model = codec::read_model(&model_path).map_err(|source| ArtifactError::Decode {
            file: MODEL_FILE,
            source,
        })?;
        let scaler = codec::read_scaler(&scaler_path).map_err(|source| ArtifactError::Decode {
            file: SCALER_FILE,
            source,
        })?;
        let external_names: Vec<String> =
            serde_json::from_reader(BufReader::new(File::open(&names_path)?))?;

        let schema = FeatureSchema::reconcile(external_names, scaler.feature_names());
        let reference = load_reference_table(&reference_path)?.realign(&schema)?;

        log::info!(
            "loaded artifacts from {}: {} features, {} reference rows, {:.1?}",
            dir.display(),
            schema.len(),
            reference.n_samples(),
            start.elapsed()
        );

        Ok(Self {
            model,
            scaler,
            reference,
            schema,
        })
    }

    /// Assemble a bundle from already-loaded parts.
    ///
    /// Applies the same schema reconciliation and reference realignment
    /// as [`load`](Self::load).
    pub fn from_parts(
        model: RegressionModel,
        scaler: StandardScaler,
        reference: ReferenceTable,
        external_names: Vec<String>,
    ) -> Result<Self, ArtifactError> {
        let schema = FeatureSchema::reconcile(external_names, scaler.feature_names());
        let reference = reference.realign(&schema)?;
        Ok(Self {
            model,
            scaler,
            reference,
            schema,
        })
    }

    /// The loaded regression model.
    pub fn model(&self) -> &RegressionModel {
        &self.model
    }

    /// The loaded fitted scaler.
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// The reference dataset, aligned to the resolved schema.
    pub fn reference(&self) -> &ReferenceTable {
        &self.reference
    }

    /// The resolved feature schema.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}

fn required(dir: &Path, file: &str) -> Result<PathBuf, ArtifactError> {
    let path = dir.join(file);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ArtifactError::Missing(path))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::model::LinearModel;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn reference(columns: &[&str]) -> ReferenceTable {
        ReferenceTable::new(array![[1.0f32, 2.0], [3.0, 4.0]], names(columns))
    }

    #[test]
    fn from_parts_prefers_scaler_names() {
        let bundle = ArtifactBundle::from_parts(
            RegressionModel::Linear(LinearModel::new(vec![1.0, 1.0], 0.0)),
            StandardScaler::new(vec![0.0, 0.0], vec![1.0, 1.0], Some(names(&["a", "b"]))),
            reference(&["b", "a"]),
            names(&["ignored", "list"]),
        )
        .unwrap();

        assert_eq!(bundle.schema().names(), names(&["a", "b"]).as_slice());
        // reference realigned to schema order: column "a" first
        assert_eq!(bundle.reference().value(0, 0), 2.0);
    }

    #[test]
    fn from_parts_rejects_unalignable_reference() {
        let result = ArtifactBundle::from_parts(
            RegressionModel::Linear(LinearModel::new(vec![1.0, 1.0], 0.0)),
            StandardScaler::new(vec![0.0, 0.0], vec![1.0, 1.0], None),
            reference(&["x", "y"]),
            names(&["a", "b"]),
        );
        assert!(matches!(result, Err(ArtifactError::Schema(_))));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        match err {
            ArtifactError::Missing(path) => {
                assert!(path.ends_with(MODEL_FILE));
            }
            other => panic!("expected Missing, got {other:?}"),
        }
    }
}
