//! Per-interaction orchestration: input → scale → predict → explain.
//!
//! The pipeline is a single linear sequence executed fresh for every
//! interaction, with two isolated error domains at the end: a failed
//! attribution never suppresses the surrogate and vice versa, and a
//! prediction is still reported when both explanations fail.

use std::time::Instant;

use crate::artifacts::ArtifactBundle;
use crate::explain::{
    Attribution, AttributionError, AttributionExplainer, SurrogateConfig, SurrogateError,
    SurrogateExplainer, SurrogateReport,
};
use crate::input::InputVector;
use crate::model::PredictError;
use crate::scaler::{ScaledVector, ScaleError};

/// Failures that halt an interaction before the explanation stages.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("scaling failed: {0}")]
    Scaling(#[from] ScaleError),

    #[error("prediction failed: {0}")]
    Prediction(#[from] PredictError),
}

impl PipelineError {
    /// Name of the failing stage, for user-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Scaling(_) => "scaling",
            Self::Prediction(_) => "prediction",
        }
    }
}

/// Everything one interaction produced.
///
/// The two explanation results are independent; either may fail while
/// the other (and the prediction) still renders.
#[derive(Debug)]
pub struct InteractionReport {
    /// The scaled input the model saw.
    pub scaled: ScaledVector,
    /// The model's raw prediction.
    pub prediction: f32,
    /// Additive attribution, or its isolated failure.
    pub attribution: Result<Attribution, AttributionError>,
    /// Local surrogate, or its isolated failure.
    pub surrogate: Result<SurrogateReport, SurrogateError>,
}

impl InteractionReport {
    /// The prediction rounded to two decimals for display.
    ///
    /// Full precision still flows into both explanations.
    pub fn display_prediction(&self) -> f64 {
        (self.prediction as f64 * 100.0).round() / 100.0
    }
}

/// The interaction pipeline, bound to a loaded artifact bundle.
///
/// Both explainers are constructed once here; an attribution explainer
/// that cannot be built (e.g. a tree model without cover statistics)
/// degrades to a per-interaction attribution error instead of failing
/// initialization.
pub struct Pipeline<'a> {
    bundle: &'a ArtifactBundle,
    attribution: Result<AttributionExplainer<'a>, AttributionError>,
    surrogate: SurrogateExplainer<'a>,
}

impl<'a> Pipeline<'a> {
    /// Build the pipeline and its explainers over a loaded bundle.
    pub fn new(bundle: &'a ArtifactBundle, surrogate_config: SurrogateConfig) -> Self {
        let attribution = AttributionExplainer::new(bundle.model(), bundle.reference());
        if let Err(e) = &attribution {
            log::warn!("attribution explainer unavailable: {e}");
        }
        let surrogate = SurrogateExplainer::new(bundle.reference(), surrogate_config);
        Self {
            bundle,
            attribution,
            surrogate,
        }
    }

    /// The bundle this pipeline runs against.
    pub fn bundle(&self) -> &ArtifactBundle {
        self.bundle
    }

    /// Execute one interaction.
    ///
    /// Scaling and prediction failures halt the interaction; explanation
    /// failures are embedded in the report.
    pub fn run(&self, input: &InputVector) -> Result<InteractionReport, PipelineError> {
        let start = Instant::now();

        let scaled = self.bundle.scaler().transform(input)?;
        let prediction = self.bundle.model().predict_row(scaled.values())?;

        let attribution = match &self.attribution {
            Ok(explainer) => explainer.explain(scaled.values()),
            Err(e) => Err(e.clone()),
        };
        let surrogate = self
            .surrogate
            .explain(scaled.values(), |rows| self.bundle.model().predict_batch(rows));

        log::debug!(
            "interaction: prediction {prediction:.4}, attribution {}, surrogate {}, {:.1?}",
            if attribution.is_ok() { "ok" } else { "failed" },
            if surrogate.is_ok() { "ok" } else { "failed" },
            start.elapsed()
        );

        Ok(InteractionReport {
            scaled,
            prediction,
            attribution,
            surrogate,
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::data::ReferenceTable;
    use crate::model::{LinearModel, RegressionModel, Tree, TreeModel};
    use crate::scaler::StandardScaler;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn reference() -> ReferenceTable {
        ReferenceTable::new(
            array![
                [0.0f32, 1.0],
                [1.0, 2.0],
                [2.0, 3.0],
                [3.0, 4.0],
            ],
            names(&["a", "b"]),
        )
    }

    fn tree_bundle(with_covers: bool) -> ArtifactBundle {
        let mut tree = Tree::stump(0, 0.0, -1.0, 1.0, 50.0, 50.0);
        if !with_covers {
            tree = tree.without_covers();
        }
        ArtifactBundle::from_parts(
            RegressionModel::Tree(TreeModel::new(vec![tree], 5.0, 2)),
            StandardScaler::new(vec![1.5, 2.5], vec![1.0, 1.0], Some(names(&["a", "b"]))),
            reference(),
            names(&["a", "b"]),
        )
        .unwrap()
    }

    #[test]
    fn full_run_produces_all_sections() {
        let bundle = tree_bundle(true);
        let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());
        let input = InputVector::zeros(bundle.schema());

        let report = pipeline.run(&input).unwrap();
        // input 0 scales to -1.5 < 0 -> left leaf -1, plus base 5
        assert_eq!(report.prediction, 4.0);
        let attr = report.attribution.unwrap();
        assert_eq!(attr.n_features(), bundle.schema().len());
        assert!(attr.verify(report.prediction as f64, 1e-6));
        assert!(report.surrogate.is_ok());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let bundle = tree_bundle(true);
        let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());
        let input = InputVector::from_pairs(bundle.schema(), &[("a", 2.0), ("b", 3.0)]).unwrap();

        let first = pipeline.run(&input).unwrap();
        let second = pipeline.run(&input).unwrap();
        assert_eq!(first.prediction, second.prediction);
        assert_eq!(first.attribution.unwrap(), second.attribution.unwrap());
        assert_eq!(first.surrogate.unwrap(), second.surrogate.unwrap());
    }

    #[test]
    fn scaling_failure_halts_before_prediction() {
        // Scaler fitted on three features, schema resolves to two.
        let bundle = ArtifactBundle::from_parts(
            RegressionModel::Linear(LinearModel::new(vec![1.0, 1.0], 0.0)),
            StandardScaler::new(vec![0.0; 3], vec![1.0; 3], None),
            reference(),
            names(&["a", "b"]),
        )
        .unwrap();
        let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());

        let err = pipeline.run(&InputVector::zeros(bundle.schema())).unwrap_err();
        assert!(matches!(err, PipelineError::Scaling(_)));
        assert_eq!(err.stage(), "scaling");
    }

    #[test]
    fn prediction_failure_halts_before_explanations() {
        let bundle = ArtifactBundle::from_parts(
            RegressionModel::Linear(LinearModel::new(vec![f32::INFINITY, 0.0], 0.0)),
            StandardScaler::new(vec![0.0, 0.0], vec![1.0, 1.0], Some(names(&["a", "b"]))),
            reference(),
            names(&["a", "b"]),
        )
        .unwrap();
        let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());

        let input = InputVector::from_pairs(bundle.schema(), &[("a", 1.0)]).unwrap();
        let err = pipeline.run(&input).unwrap_err();
        assert!(matches!(err, PipelineError::Prediction(_)));
        assert_eq!(err.stage(), "prediction");
    }

    #[test]
    fn attribution_failure_does_not_block_surrogate() {
        let bundle = tree_bundle(false);
        let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());

        let report = pipeline.run(&InputVector::zeros(bundle.schema())).unwrap();
        assert_eq!(report.prediction, 4.0);
        assert_eq!(
            report.attribution.unwrap_err(),
            AttributionError::MissingNodeStats
        );
        assert!(report.surrogate.is_ok());
    }

    #[test]
    fn display_prediction_rounds_to_two_decimals() {
        let bundle = tree_bundle(true);
        let pipeline = Pipeline::new(&bundle, SurrogateConfig::default());
        let mut report = pipeline.run(&InputVector::zeros(bundle.schema())).unwrap();
        assert_eq!(report.display_prediction(), 4.0);

        report.prediction = 1.23456;
        assert_eq!(report.display_prediction(), 1.23);
    }
}
