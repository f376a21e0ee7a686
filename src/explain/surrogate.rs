//! Local surrogate explanation: a weighted linear fit around one instance.
//!
//! Perturbed neighbors are drawn by per-column resampling from the
//! reference table, weighted by an exponential kernel on standardized
//! distance to the instance, and fitted with a weighted ridge regression
//! by cyclic coordinate descent. The resulting per-feature weights
//! approximate the model locally and are valid only for the explained
//! instance.

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::ReferenceTable;
use crate::model::PredictError;

/// Probability that a perturbed sample keeps the instance's value for a
/// given feature (versus resampling it from the reference column).
const KEEP_PROBABILITY: f64 = 0.5;

/// Coordinate-descent convergence threshold on the largest weight delta.
const CONVERGENCE_TOLERANCE: f64 = 1e-8;

/// Errors raised by the surrogate explainer.
#[derive(Debug, thiserror::Error)]
pub enum SurrogateError {
    #[error("surrogate prediction batch failed: {0}")]
    PredictionFailed(#[from] PredictError),

    #[error("feature count mismatch: reference has {expected}, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },

    #[error("kernel weights collapsed to zero")]
    DegenerateKernel,
}

/// Configuration for the surrogate fit.
#[derive(Debug, Clone)]
pub struct SurrogateConfig {
    /// Number of perturbed samples (the instance itself is row 0).
    pub n_samples: usize,
    /// Kernel bandwidth; `None` uses `0.75 * sqrt(n_features)`.
    pub kernel_width: Option<f64>,
    /// L2 regularization strength of the ridge fit.
    pub ridge: f64,
    /// Maximum coordinate-descent rounds.
    pub max_rounds: usize,
    /// RNG seed; fixed by default so repeat interactions are reproducible.
    pub seed: u64,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            n_samples: 512,
            kernel_width: None,
            ridge: 1.0,
            max_rounds: 64,
            seed: 42,
        }
    }
}

/// Result of one surrogate fit.
///
/// Weights are expressed over standardized features (offset from the
/// reference column mean, divided by the column scale), so they are
/// comparable across features with different units.
#[derive(Debug, Clone, PartialEq)]
pub struct SurrogateReport {
    weights: Vec<f64>,
    intercept: f64,
    local_prediction: f64,
    score: f64,
    n_samples: usize,
    kernel_width: f64,
}

impl SurrogateReport {
    /// Per-feature local weights in schema order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight of one feature.
    #[inline]
    pub fn weight(&self, feature: usize) -> f64 {
        self.weights[feature]
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Intercept of the local linear model.
    #[inline]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// The surrogate's own prediction at the explained instance.
    #[inline]
    pub fn local_prediction(&self) -> f64 {
        self.local_prediction
    }

    /// Kernel-weighted coefficient of determination of the fit.
    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Number of perturbed samples used.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Kernel bandwidth used.
    #[inline]
    pub fn kernel_width(&self) -> f64 {
        self.kernel_width
    }

    /// Feature indices with weights, sorted by |weight| descending.
    pub fn ranked(&self) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.weights.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }
}

/// Local surrogate explainer bound to the reference table.
///
/// Stateless per explanation: every call draws a fresh perturbation
/// sample from the configured seed.
pub struct SurrogateExplainer<'a> {
    reference: &'a ReferenceTable,
    config: SurrogateConfig,
}

impl<'a> SurrogateExplainer<'a> {
    /// Create an explainer over the reference table.
    pub fn new(reference: &'a ReferenceTable, config: SurrogateConfig) -> Self {
        Self { reference, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &SurrogateConfig {
        &self.config
    }

    /// Fit a local surrogate around `instance` using `predict` as the
    /// black-box model.
    pub fn explain<F>(
        &self,
        instance: ArrayView1<'_, f32>,
        predict: F,
    ) -> Result<SurrogateReport, SurrogateError>
    where
        F: Fn(ArrayView2<'_, f32>) -> Result<Vec<f32>, PredictError>,
    {
        let n_features = self.reference.n_features();
        if instance.len() != n_features {
            return Err(SurrogateError::FeatureCountMismatch {
                expected: n_features,
                got: instance.len(),
            });
        }

        let n_samples = self.config.n_samples.max(2);
        let samples = self.draw_samples(instance, n_samples);
        let targets = predict(samples.view())?;

        // Standardize against the reference distribution; distances and the
        // linear fit both live in this space.
        let means = self.reference.column_means();
        let scales = self.reference.column_scales();
        let mut x = Array2::<f64>::zeros((n_samples, n_features));
        for i in 0..n_samples {
            for j in 0..n_features {
                x[[i, j]] = (samples[[i, j]] as f64 - means[j] as f64) / scales[j] as f64;
            }
        }

        let kernel_width = self
            .config
            .kernel_width
            .unwrap_or_else(|| 0.75 * (n_features as f64).sqrt());
        let kernel = kernel_weights(x.view(), kernel_width);
        let total_weight: f64 = kernel.iter().sum();
        if total_weight <= f64::EPSILON {
            return Err(SurrogateError::DegenerateKernel);
        }

        let y: Vec<f64> = targets.iter().map(|&t| t as f64).collect();
        let fit = weighted_ridge(
            x.view(),
            &y,
            &kernel,
            self.config.ridge,
            self.config.max_rounds,
        );

        Ok(SurrogateReport {
            local_prediction: fit.predictions[0],
            score: weighted_r2(&y, &fit.predictions, &kernel),
            weights: fit.weights,
            intercept: fit.intercept,
            n_samples,
            kernel_width,
        })
    }

    /// Draw the perturbation sample; row 0 is the instance itself.
    fn draw_samples(&self, instance: ArrayView1<'_, f32>, n_samples: usize) -> Array2<f32> {
        let n_features = self.reference.n_features();
        let n_rows = self.reference.n_samples();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        let mut samples = Array2::<f32>::zeros((n_samples, n_features));
        samples.row_mut(0).assign(&instance);
        for i in 1..n_samples {
            for j in 0..n_features {
                samples[[i, j]] = if rng.gen_bool(KEEP_PROBABILITY) {
                    instance[j]
                } else {
                    self.reference.value(rng.gen_range(0..n_rows), j)
                };
            }
        }
        samples
    }
}

/// Exponential kernel on euclidean distance to row 0.
fn kernel_weights(x: ArrayView2<'_, f64>, width: f64) -> Vec<f64> {
    let instance = x.row(0);
    let width_sq = width * width;
    (0..x.nrows())
        .map(|i| {
            let d_sq: f64 = x
                .row(i)
                .iter()
                .zip(instance.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            (-d_sq / width_sq).exp()
        })
        .collect()
}

struct RidgeFit {
    weights: Vec<f64>,
    intercept: f64,
    predictions: Vec<f64>,
}

/// Weighted ridge regression by cyclic coordinate descent.
///
/// Predictions are maintained incrementally: each coordinate update
/// applies its delta to the running prediction vector instead of
/// recomputing the full design product.
fn weighted_ridge(
    x: ArrayView2<'_, f64>,
    y: &[f64],
    sample_weights: &[f64],
    ridge: f64,
    max_rounds: usize,
) -> RidgeFit {
    let n_samples = x.nrows();
    let n_features = x.ncols();
    let total_weight: f64 = sample_weights.iter().sum();

    // Per-coordinate denominators are constant across rounds.
    let denominators: Vec<f64> = (0..n_features)
        .map(|j| {
            let sum_sq: f64 = (0..n_samples)
                .map(|i| sample_weights[i] * x[[i, j]] * x[[i, j]])
                .sum();
            sum_sq + ridge
        })
        .collect();

    let mut weights = vec![0.0f64; n_features];
    let mut intercept: f64 = (0..n_samples)
        .map(|i| sample_weights[i] * y[i])
        .sum::<f64>()
        / total_weight;
    let mut predictions = vec![intercept; n_samples];

    for _ in 0..max_rounds {
        let mut max_delta = 0.0f64;

        let intercept_delta: f64 = (0..n_samples)
            .map(|i| sample_weights[i] * (y[i] - predictions[i]))
            .sum::<f64>()
            / total_weight;
        intercept += intercept_delta;
        for p in &mut predictions {
            *p += intercept_delta;
        }
        max_delta = max_delta.max(intercept_delta.abs());

        for j in 0..n_features {
            if denominators[j] <= 0.0 {
                continue;
            }
            let gradient: f64 = (0..n_samples)
                .map(|i| sample_weights[i] * x[[i, j]] * (y[i] - predictions[i]))
                .sum();
            let delta = (gradient - ridge * weights[j]) / denominators[j];
            weights[j] += delta;
            for i in 0..n_samples {
                predictions[i] += delta * x[[i, j]];
            }
            max_delta = max_delta.max(delta.abs());
        }

        if max_delta < CONVERGENCE_TOLERANCE {
            break;
        }
    }

    RidgeFit {
        weights,
        intercept,
        predictions,
    }
}

/// Kernel-weighted coefficient of determination.
fn weighted_r2(y: &[f64], predictions: &[f64], sample_weights: &[f64]) -> f64 {
    let total_weight: f64 = sample_weights.iter().sum();
    let y_mean: f64 = y
        .iter()
        .zip(sample_weights)
        .map(|(yi, w)| w * yi)
        .sum::<f64>()
        / total_weight;
    let ss_tot: f64 = y
        .iter()
        .zip(sample_weights)
        .map(|(yi, w)| w * (yi - y_mean) * (yi - y_mean))
        .sum();
    let ss_res: f64 = y
        .iter()
        .zip(predictions)
        .zip(sample_weights)
        .map(|((yi, pi), w)| w * (yi - pi) * (yi - pi))
        .sum();
    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    /// Two features with identical spread, so fitted weights are
    /// magnitude-comparable.
    fn reference() -> ReferenceTable {
        ReferenceTable::new(
            array![
                [0.0f32, 10.0],
                [1.0, 11.0],
                [2.0, 12.0],
                [3.0, 13.0],
                [4.0, 14.0],
                [5.0, 15.0],
            ],
            vec!["a".to_string(), "b".to_string()],
        )
    }

    fn linear_predict(rows: ArrayView2<'_, f32>) -> Result<Vec<f32>, PredictError> {
        // y = 3*a - 2*b + 1
        Ok((0..rows.nrows())
            .map(|i| 3.0 * rows[[i, 0]] - 2.0 * rows[[i, 1]] + 1.0)
            .collect())
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let table = reference();
        let explainer = SurrogateExplainer::new(&table, SurrogateConfig::default());
        let instance = array![2.5f32, 12.0];

        let a = explainer.explain(instance.view(), linear_predict).unwrap();
        let b = explainer.explain(instance.view(), linear_predict).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let table = reference();
        let base = SurrogateExplainer::new(&table, SurrogateConfig::default());
        let other = SurrogateExplainer::new(
            &table,
            SurrogateConfig {
                seed: 7,
                ..SurrogateConfig::default()
            },
        );
        let instance = array![2.5f32, 12.0];

        let a = base.explain(instance.view(), linear_predict).unwrap();
        let b = other.explain(instance.view(), linear_predict).unwrap();
        assert_ne!(a.weights(), b.weights());
    }

    #[test]
    fn recovers_linear_structure() {
        let table = reference();
        let explainer = SurrogateExplainer::new(&table, SurrogateConfig::default());
        let instance = array![2.5f32, 12.5];

        let report = explainer.explain(instance.view(), linear_predict).unwrap();
        assert_eq!(report.n_features(), 2);

        // Signs follow the true model; both columns have equal scale, so
        // feature a (|coef| 3) outweighs feature b (|coef| 2).
        assert!(report.weight(0) > 0.0);
        assert!(report.weight(1) < 0.0);
        assert!(report.weight(0).abs() > report.weight(1).abs());

        // The fit should explain a linear target well.
        assert!(report.score() > 0.5, "score = {}", report.score());

        // Local prediction near the true value at the instance.
        let truth = 3.0 * 2.5 - 2.0 * 12.5 + 1.0;
        assert_abs_diff_eq!(report.local_prediction(), truth, epsilon = 2.0);
    }

    #[test]
    fn ranked_orders_by_magnitude() {
        let table = reference();
        let explainer = SurrogateExplainer::new(&table, SurrogateConfig::default());
        let report = explainer
            .explain(array![2.5f32, 12.5].view(), linear_predict)
            .unwrap();
        let ranked = report.ranked();
        assert_eq!(ranked[0].0, 0);
        assert_eq!(ranked[1].0, 1);
    }

    #[test]
    fn default_kernel_width_scales_with_features() {
        let table = reference();
        let explainer = SurrogateExplainer::new(&table, SurrogateConfig::default());
        let report = explainer
            .explain(array![0.0f32, 10.0].view(), linear_predict)
            .unwrap();
        assert_abs_diff_eq!(report.kernel_width(), 0.75 * 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn wrong_feature_count_is_rejected() {
        let table = reference();
        let explainer = SurrogateExplainer::new(&table, SurrogateConfig::default());
        let err = explainer
            .explain(array![1.0f32].view(), linear_predict)
            .unwrap_err();
        assert!(matches!(
            err,
            SurrogateError::FeatureCountMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn prediction_failure_propagates() {
        let table = reference();
        let explainer = SurrogateExplainer::new(&table, SurrogateConfig::default());
        let err = explainer
            .explain(array![1.0f32, 10.0].view(), |_| Err(PredictError::NonFinite))
            .unwrap_err();
        assert!(matches!(err, SurrogateError::PredictionFailed(_)));
    }
}
