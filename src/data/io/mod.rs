//! Reference-table file loading.
//!
//! The reference dataset ships as a Parquet table; loading goes through
//! Arrow record batches into an `ndarray` matrix with column names taken
//! from the Arrow schema.

mod error;
mod parquet;

pub use error::TableLoadError;
pub use parquet::load_reference_table;
