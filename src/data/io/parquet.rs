//! Parquet reference-table loader.
//!
//! Reads the whole file into Arrow record batches, converts every column
//! to `f32`, and assembles a sample-major matrix. Nulls become `f32::NAN`
//! and flow through the pipeline's NaN handling.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::TableLoadError;
use crate::data::ReferenceTable;

/// Load a Parquet file into a [`ReferenceTable`].
///
/// Column names come from the Arrow schema; column order is whatever the
/// file stores, so callers are expected to realign to the resolved
/// feature schema afterwards.
pub fn load_reference_table(path: impl AsRef<Path>) -> Result<ReferenceTable, TableLoadError> {
    let file = File::open(path.as_ref())?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>()?;

    let columns: Vec<String> = schema.fields().iter().map(|f| f.name().to_string()).collect();
    if columns.is_empty() {
        return Err(TableLoadError::NoColumns);
    }

    // Gather each column across all batches.
    let mut column_values: Vec<Vec<f32>> = vec![Vec::new(); columns.len()];
    for batch in &batches {
        for (idx, name) in columns.iter().enumerate() {
            column_to_f32(batch.column(idx), name, &mut column_values[idx])?;
        }
    }

    let n_samples = column_values[0].len();
    if n_samples == 0 {
        return Err(TableLoadError::Empty);
    }

    // Interleave into sample-major order.
    let n_features = columns.len();
    let mut data = Vec::with_capacity(n_samples * n_features);
    for row in 0..n_samples {
        for col in &column_values {
            data.push(col[row]);
        }
    }
    let values = Array2::from_shape_vec((n_samples, n_features), data)
        .map_err(|e| arrow::error::ArrowError::ComputeError(e.to_string()))?;

    Ok(ReferenceTable::new(values, columns))
}

/// Append one Arrow column's values as `f32`, nulls as NaN.
fn column_to_f32(
    column: &ArrayRef,
    name: &str,
    out: &mut Vec<f32>,
) -> Result<(), TableLoadError> {
    match column.data_type() {
        DataType::Float32 => {
            let arr = column
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| unsupported(name, column))?;
            out.extend(arr.iter().map(|v| v.unwrap_or(f32::NAN)));
        }
        DataType::Float64 => {
            let arr = column
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| unsupported(name, column))?;
            out.extend(arr.iter().map(|v| v.map(|x| x as f32).unwrap_or(f32::NAN)));
        }
        DataType::Int32 => {
            let arr = column
                .as_any()
                .downcast_ref::<Int32Array>()
                .ok_or_else(|| unsupported(name, column))?;
            out.extend(arr.iter().map(|v| v.map(|x| x as f32).unwrap_or(f32::NAN)));
        }
        DataType::Int64 => {
            let arr = column
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| unsupported(name, column))?;
            out.extend(arr.iter().map(|v| v.map(|x| x as f32).unwrap_or(f32::NAN)));
        }
        _ => return Err(unsupported(name, column)),
    }
    Ok(())
}

fn unsupported(name: &str, column: &ArrayRef) -> TableLoadError {
    TableLoadError::UnsupportedType {
        column: name.to_string(),
        got: column.data_type().to_string(),
    }
}
