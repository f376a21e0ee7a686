//! Shared error types for reference-table I/O.

use std::io;

/// Errors that can occur when loading the reference table.
#[derive(Debug, thiserror::Error)]
pub enum TableLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("unsupported column type for {column}: expected a numeric type, got {got}")]
    UnsupportedType { column: String, got: String },

    #[error("reference table has no rows")]
    Empty,

    #[error("reference table has no columns")]
    NoColumns,
}
