//! Feature schema: the ordered feature-name list all vectors align to.

use std::collections::HashMap;

/// Ordered list of feature names.
///
/// The schema fixes both the length and the column order of every input,
/// scaled, and attribution vector in the pipeline. Misalignment between
/// the schema and the model's training-time feature order silently
/// corrupts predictions and explanations, so the schema is resolved once
/// at load time and never re-derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
    name_index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Create a schema from an ordered name list.
    pub fn new(names: Vec<String>) -> Self {
        let name_index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, name_index }
    }

    /// Resolve the authoritative schema from the externally supplied name
    /// list and the scaler's fitted names.
    ///
    /// If the scaler recorded the feature names it was fitted on, that
    /// list wins regardless of the external list's content or order. This
    /// guarantees scaler/model/input alignment.
    pub fn reconcile(external: Vec<String>, fitted: Option<&[String]>) -> Self {
        match fitted {
            Some(names) => Self::new(names.to_vec()),
            None => Self::new(external),
        }
    }

    /// Number of features.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The ordered name list.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of the feature at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Index of the feature with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// Iterate over feature names in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
