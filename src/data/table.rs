//! Reference table: named numeric columns from the training distribution.

use ndarray::{Array2, ArrayView1, ArrayView2};

use super::FeatureSchema;

/// Reference dataset loaded at startup.
///
/// # Storage Layout
///
/// Values are stored in **sample-major** layout: `[n_samples, n_features]`.
/// Each row is one observation; columns follow the resolved feature schema
/// after [`realign`](Self::realign).
///
/// Per-column mean and scale (standard deviation, with zero-variance
/// columns mapped to 1.0) are computed once at construction; the surrogate
/// explainer uses them for distance standardization and the attribution
/// explainer for baselines.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    /// Value matrix: `[n_samples, n_features]` (sample-major).
    values: Array2<f32>,

    /// Column names, same order as the matrix columns.
    columns: Vec<String>,

    /// Per-column mean.
    means: Vec<f32>,

    /// Per-column standard deviation, zero-variance columns as 1.0.
    scales: Vec<f32>,
}

/// Reference-table columns cannot be aligned to the resolved schema.
#[derive(Debug, Clone, thiserror::Error)]
#[error("reference columns {found:?} do not match feature schema {expected:?}")]
pub struct SchemaMismatch {
    /// The resolved schema's names.
    pub expected: Vec<String>,
    /// The column names found in the table.
    pub found: Vec<String>,
}

impl ReferenceTable {
    /// Create a table from a sample-major matrix and its column names.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `columns.len()` matches the matrix width.
    pub fn new(values: Array2<f32>, columns: Vec<String>) -> Self {
        debug_assert_eq!(
            columns.len(),
            values.ncols(),
            "column names must match matrix width"
        );
        let (means, scales) = column_stats(values.view());
        Self {
            values,
            columns,
            means,
            scales,
        }
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    /// Number of features (columns).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Column names in storage order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The full value matrix, `[n_samples, n_features]`.
    pub fn values(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// One sample row.
    pub fn row(&self, sample: usize) -> ArrayView1<'_, f32> {
        self.values.row(sample)
    }

    /// Single cell access.
    #[inline]
    pub fn value(&self, sample: usize, feature: usize) -> f32 {
        self.values[[sample, feature]]
    }

    /// Per-column means.
    pub fn column_means(&self) -> &[f32] {
        &self.means
    }

    /// Per-column scales (standard deviation, zero-variance as 1.0).
    pub fn column_scales(&self) -> &[f32] {
        &self.scales
    }

    /// Align the table's columns to the resolved feature schema.
    ///
    /// A table whose columns are a permutation of the schema is reordered
    /// to schema order; an exact match passes through unchanged. Any other
    /// difference (missing name, extra name, wrong count) is an error.
    pub fn realign(self, schema: &FeatureSchema) -> Result<Self, SchemaMismatch> {
        if self.columns.len() != schema.len() {
            return Err(self.mismatch(schema));
        }
        if self
            .columns
            .iter()
            .zip(schema.iter())
            .all(|(c, s)| c == s)
        {
            return Ok(self);
        }

        // Permutation: position in the current table of each schema column.
        let mut order = Vec::with_capacity(schema.len());
        for name in schema.iter() {
            match self.columns.iter().position(|c| c == name) {
                Some(idx) => order.push(idx),
                None => return Err(self.mismatch(schema)),
            }
        }

        let n_samples = self.values.nrows();
        let mut reordered = Array2::<f32>::zeros((n_samples, order.len()));
        for (dst, &src) in order.iter().enumerate() {
            reordered
                .column_mut(dst)
                .assign(&self.values.column(src));
        }
        Ok(Self::new(reordered, schema.names().to_vec()))
    }

    fn mismatch(&self, schema: &FeatureSchema) -> SchemaMismatch {
        SchemaMismatch {
            expected: schema.names().to_vec(),
            found: self.columns.clone(),
        }
    }
}

/// Compute per-column mean and scale in one pass per column.
fn column_stats(values: ArrayView2<'_, f32>) -> (Vec<f32>, Vec<f32>) {
    let n = values.nrows();
    let mut means = Vec::with_capacity(values.ncols());
    let mut scales = Vec::with_capacity(values.ncols());

    for col in values.columns() {
        let mean = if n == 0 {
            0.0
        } else {
            col.iter().map(|&v| v as f64).sum::<f64>() / n as f64
        };
        let var = if n == 0 {
            0.0
        } else {
            col.iter()
                .map(|&v| {
                    let d = v as f64 - mean;
                    d * d
                })
                .sum::<f64>()
                / n as f64
        };
        let std = var.sqrt();
        means.push(mean as f32);
        scales.push(if std > 0.0 { std as f32 } else { 1.0 });
    }

    (means, scales)
}
