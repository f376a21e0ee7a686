//! End-to-end tests over a real artifact directory.
//!
//! Fixtures are written through the same code paths the dashboard loads
//! from: models and scalers via the native codec, the reference table via
//! an Arrow/Parquet writer, feature names via serde_json.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

use glassbox::artifacts::{codec, FEATURE_NAMES_FILE, MODEL_FILE, REFERENCE_FILE, SCALER_FILE};
use glassbox::{
    ArtifactBundle, ArtifactError, AttributionError, InputVector, Pipeline, PipelineError,
    RegressionModel, StandardScaler, SurrogateConfig, TreeModel,
};
use glassbox::model::Tree;

// =============================================================================
// Fixture Helpers
// =============================================================================

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Two stumps over three features, base score 10.
fn fixture_model(with_covers: bool) -> RegressionModel {
    let mut trees = vec![
        Tree::stump(0, 0.0, -1.0, 1.0, 60.0, 40.0),
        Tree::stump(1, 0.5, 2.0, 3.0, 50.0, 50.0),
    ];
    if !with_covers {
        trees = trees.into_iter().map(Tree::without_covers).collect();
    }
    RegressionModel::Tree(TreeModel::new(trees, 10.0, 3))
}

fn fixture_scaler() -> StandardScaler {
    StandardScaler::new(
        vec![1.0, 2.0, 3.0],
        vec![1.0, 2.0, 4.0],
        Some(names(&["mileage", "age", "rating"])),
    )
}

fn write_parquet(path: &Path, columns: &[(&str, Vec<f32>)]) {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, _)| Field::new(*name, DataType::Float32, false))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|(_, values)| Arc::new(Float32Array::from(values.clone())) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();

    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Write a complete artifact directory.
///
/// The reference table is stored with scrambled column order and the JSON
/// name list is scrambled too; resolution is expected to come from the
/// scaler's fitted names.
fn write_fixture_dir(dir: &Path, with_covers: bool) {
    codec::write_model(dir.join(MODEL_FILE), &fixture_model(with_covers)).unwrap();
    codec::write_scaler(dir.join(SCALER_FILE), &fixture_scaler()).unwrap();
    write_parquet(
        &dir.join(REFERENCE_FILE),
        &[
            ("age", vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]),
            ("rating", vec![20.0, 21.0, 22.0, 23.0, 24.0, 25.0]),
            ("mileage", vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
        ],
    );
    let json = File::create(dir.join(FEATURE_NAMES_FILE)).unwrap();
    serde_json::to_writer(json, &names(&["rating", "mileage", "age"])).unwrap();
}

// =============================================================================
// Artifact Loading
// =============================================================================

#[test]
fn load_resolves_schema_from_scaler_and_realigns_reference() {
    let dir = TempDir::new().unwrap();
    write_fixture_dir(dir.path(), true);

    let bundle = ArtifactBundle::load(dir.path()).unwrap();

    // Scaler names override the (scrambled) JSON list.
    assert_eq!(
        bundle.schema().names(),
        names(&["mileage", "age", "rating"]).as_slice()
    );

    // Reference columns realigned from file order to schema order.
    assert_eq!(bundle.reference().n_samples(), 6);
    assert_eq!(bundle.reference().value(0, 0), 0.0); // mileage
    assert_eq!(bundle.reference().value(0, 1), 10.0); // age
    assert_eq!(bundle.reference().value(0, 2), 20.0); // rating
}

#[test]
fn missing_model_file_fails_initialization() {
    let dir = TempDir::new().unwrap();
    // Nothing written: the first required file is the model.
    let err = ArtifactBundle::load(dir.path()).unwrap_err();
    match err {
        ArtifactError::Missing(path) => assert!(path.ends_with(MODEL_FILE)),
        other => panic!("expected Missing, got {other:?}"),
    }
}

#[test]
fn missing_reference_file_fails_initialization() {
    let dir = TempDir::new().unwrap();
    write_fixture_dir(dir.path(), true);
    std::fs::remove_file(dir.path().join(REFERENCE_FILE)).unwrap();

    let err = ArtifactBundle::load(dir.path()).unwrap_err();
    match err {
        ArtifactError::Missing(path) => assert!(path.ends_with(REFERENCE_FILE)),
        other => panic!("expected Missing, got {other:?}"),
    }
}

#[test]
fn corrupt_model_file_fails_initialization() {
    let dir = TempDir::new().unwrap();
    write_fixture_dir(dir.path(), true);
    std::fs::write(dir.path().join(MODEL_FILE), b"not an artifact").unwrap();

    let err = ArtifactBundle::load(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        ArtifactError::Decode {
            file: MODEL_FILE,
            ..
        }
    ));
}

#[test]
fn scaler_in_model_slot_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_fixture_dir(dir.path(), true);
    codec::write_scaler(dir.path().join(MODEL_FILE), &fixture_scaler()).unwrap();

    let err = ArtifactBundle::load(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        ArtifactError::Decode {
            file: MODEL_FILE,
            ..
        }
    ));
}

#[test]
fn unalignable_reference_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_fixture_dir(dir.path(), true);
    write_parquet(
        &dir.path().join(REFERENCE_FILE),
        &[
            ("mileage", vec![0.0, 1.0]),
            ("age", vec![10.0, 11.0]),
            ("stars", vec![20.0, 21.0]), // not in the schema
        ],
    );

    let err = ArtifactBundle::load(dir.path()).unwrap_err();
    assert!(matches!(err, ArtifactError::Schema(_)));
}

// =============================================================================
// Interaction Properties
// =============================================================================

#[test]
fn zero_input_interaction_is_deterministic_and_consistent() {
    let dir = TempDir::new().unwrap();
    write_fixture_dir(dir.path(), true);
    let bundle = ArtifactBundle::load(dir.path()).unwrap();
    let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());

    let input = InputVector::zeros(bundle.schema());
    let first = pipeline.run(&input).unwrap();
    let second = pipeline.run(&input).unwrap();

    // scaled = [-1.0, -1.0, -0.75]; tree0 -> -1, tree1 -> 2, base 10
    assert_eq!(first.prediction, 11.0);
    assert_eq!(first.prediction, second.prediction);

    // Feature-count invariant across the whole chain.
    let n = bundle.schema().len();
    assert_eq!(input.len(), n);
    assert_eq!(first.scaled.len(), n);
    let attribution = first.attribution.as_ref().unwrap();
    assert_eq!(attribution.n_features(), n);

    // Sum property and repeatability.
    assert!(attribution.verify(first.prediction as f64, 1e-6));
    assert_eq!(attribution, second.attribution.as_ref().unwrap());

    // The surrogate is seeded, so repeats are identical too.
    assert_eq!(
        first.surrogate.as_ref().unwrap(),
        second.surrogate.as_ref().unwrap()
    );
    assert_eq!(first.surrogate.unwrap().n_features(), n);
}

#[test]
fn scaler_feature_count_mismatch_halts_interaction() {
    let dir = TempDir::new().unwrap();
    write_fixture_dir(dir.path(), true);
    // A scaler fitted on four unnamed features: the schema then resolves
    // from the JSON list (three names) and scaling must reject the input.
    codec::write_scaler(
        dir.path().join(SCALER_FILE),
        &StandardScaler::new(vec![0.0; 4], vec![1.0; 4], None),
    )
    .unwrap();
    write_parquet(
        &dir.path().join(REFERENCE_FILE),
        &[
            ("rating", vec![20.0, 21.0]),
            ("mileage", vec![0.0, 1.0]),
            ("age", vec![10.0, 11.0]),
        ],
    );

    let bundle = ArtifactBundle::load(dir.path()).unwrap();
    let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());

    let err = pipeline.run(&InputVector::zeros(bundle.schema())).unwrap_err();
    assert!(matches!(err, PipelineError::Scaling(_)));
    assert_eq!(err.stage(), "scaling");
}

#[test]
fn attribution_failure_leaves_prediction_and_surrogate_intact() {
    let dir = TempDir::new().unwrap();
    write_fixture_dir(dir.path(), false); // trees without covers

    let bundle = ArtifactBundle::load(dir.path()).unwrap();
    let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());

    let report = pipeline.run(&InputVector::zeros(bundle.schema())).unwrap();
    assert_eq!(report.prediction, 11.0);
    assert_eq!(
        report.attribution.unwrap_err(),
        AttributionError::MissingNodeStats
    );
    assert!(report.surrogate.is_ok());
}

#[test]
fn named_input_follows_schema_order() {
    let dir = TempDir::new().unwrap();
    write_fixture_dir(dir.path(), true);
    let bundle = ArtifactBundle::load(dir.path()).unwrap();
    let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());

    // Same values given in two different pair orders must agree.
    let a = InputVector::from_pairs(
        bundle.schema(),
        &[("rating", 7.0), ("mileage", 4.0), ("age", 1.0)],
    )
    .unwrap();
    let b = InputVector::from_pairs(
        bundle.schema(),
        &[("mileage", 4.0), ("age", 1.0), ("rating", 7.0)],
    )
    .unwrap();
    assert_eq!(a, b);

    let report_a = pipeline.run(&a).unwrap();
    let report_b = pipeline.run(&b).unwrap();
    assert_eq!(report_a.prediction, report_b.prediction);

    // mileage 4.0 scales to 3.0 >= 0 -> +1; age 1.0 scales to -0.5 < 0.5 -> 2
    assert_eq!(report_a.prediction, 13.0);
}
