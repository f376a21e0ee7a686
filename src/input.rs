//! Input vector assembly: user values aligned to the feature schema.

use ndarray::{Array1, ArrayView1};

use crate::data::FeatureSchema;

/// Errors raised while assembling an input vector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("unknown feature: {0}")]
    UnknownFeature(String),
}

/// One numeric value per schema feature, in schema order.
///
/// Construction walks the schema once; the column order is never
/// re-derived elsewhere. Unspecified features default to 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct InputVector {
    values: Array1<f32>,
}

impl InputVector {
    /// All-default (0.0) input for the given schema.
    pub fn zeros(schema: &FeatureSchema) -> Self {
        Self {
            values: Array1::zeros(schema.len()),
        }
    }

    /// Build an input from `(name, value)` pairs.
    ///
    /// Features absent from `pairs` default to 0.0; if a name repeats, the
    /// last value wins. Names not present in the schema are rejected
    /// rather than silently dropped.
    pub fn from_pairs<S: AsRef<str>>(
        schema: &FeatureSchema,
        pairs: &[(S, f32)],
    ) -> Result<Self, InputError> {
        let mut values = Array1::zeros(schema.len());
        for (name, value) in pairs {
            let name = name.as_ref();
            match schema.index_of(name) {
                Some(idx) => values[idx] = *value,
                None => return Err(InputError::UnknownFeature(name.to_string())),
            }
        }
        Ok(Self { values })
    }

    /// Build an input from values already in schema order.
    ///
    /// The caller vouches for the ordering; prefer [`from_pairs`](Self::from_pairs)
    /// when values are keyed by name.
    pub fn from_ordered(values: Vec<f32>) -> Self {
        Self {
            values: Array1::from_vec(values),
        }
    }

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

    /// The values in schema order.
    pub fn values(&self) -> ArrayView1<'_, f32> {
        self.values.view()
    }
}
