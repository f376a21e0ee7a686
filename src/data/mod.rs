//! Data layer: feature schema and the reference dataset.
//!
//! The schema is the authoritative ordered list of feature names; every
//! vector in the pipeline is aligned to it. The reference table holds the
//! numeric training-distribution sample that both explainers draw on.

mod schema;
mod table;

pub mod io;

pub use schema::FeatureSchema;
pub use table::{ReferenceTable, SchemaMismatch};
