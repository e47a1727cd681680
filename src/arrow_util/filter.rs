//! Filtered-batch construction (spec §4.3).
//!
//! `copy = false` takes Arrow's zero-copy selection path
//! (`arrow::compute::filter_record_batch`), cheap but keeping the parent
//! buffers alive. `copy = true` walks the enumerated column kinds and
//! rebuilds each column into a fresh, appropriately-sized buffer via a
//! typed builder ("safe-setters growing buffers" — spec §4.3) so the
//! result's memory footprint is independent of the source batch.

use arrow::array::{
    Array, ArrayRef, BinaryBuilder, BooleanBuilder, Date32Builder, Decimal128Builder,
    Float32Builder, Float64Builder, Int32Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder,
};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use super::batch::Batch;
use super::predicate::{eval_predicate, PreparedPredicate};
use crate::storage::StorageError;

/// Evaluate `predicates` (implicitly AND-ed) against `batch` and return
/// the matching rows as a new batch, or `None` if nothing matched.
pub fn filter_arrow_batch(
    batch: &Batch,
    predicates: &[PreparedPredicate],
    copy: bool,
) -> Result<Option<Batch>, StorageError> {
    let record_batch = batch.record_batch();
    let mut mask = None;
    for predicate in predicates {
        let m = eval_predicate(record_batch, predicate)?;
        mask = Some(match mask {
            None => m,
            Some(acc) => arrow::compute::and(&acc, &m).expect("masks share row count"),
        });
    }
    let mask = match mask {
        Some(m) => m,
        None => return Ok(Some(batch.clone())),
    };
    if mask.true_count() == 0 {
        return Ok(None);
    }
    if mask.true_count() == record_batch.num_rows() {
        return Ok(Some(batch.clone()));
    }

    let filtered = if copy {
        copy_filtered(record_batch, &mask)?
    } else {
        arrow::compute::filter_record_batch(record_batch, &mask)?
    };
    Ok(Some(Batch::from_record_batch(filtered)))
}

fn copy_filtered(
    batch: &RecordBatch,
    mask: &arrow::array::BooleanArray,
) -> Result<RecordBatch, StorageError> {
    let selected_rows: Vec<usize> = (0..batch.num_rows())
        .filter(|&row| mask.value(row) && !mask.is_null(row))
        .collect();
    let schema: SchemaRef = batch.schema();
    let mut columns = Vec::with_capacity(batch.num_columns());
    for col_idx in 0..batch.num_columns() {
        columns.push(copy_column(batch.column(col_idx), &selected_rows)?);
    }
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn copy_column(array: &ArrayRef, rows: &[usize]) -> Result<ArrayRef, StorageError> {
    macro_rules! build_primitive {
        ($builder:ty, $array_ty:ty) => {{
            let src = array.as_any().downcast_ref::<$array_ty>().unwrap();
            let mut builder = <$builder>::with_capacity(rows.len());
            for &row in rows {
                if src.is_null(row) {
                    builder.append_null();
                } else {
                    builder.append_value(src.value(row));
                }
            }
            Arc::new(builder.finish()) as ArrayRef
        }};
    }

    let out = match array.data_type() {
        DataType::Int32 => build_primitive!(Int32Builder, arrow::array::Int32Array),
        DataType::Int64 => build_primitive!(Int64Builder, arrow::array::Int64Array),
        DataType::Float32 => build_primitive!(Float32Builder, arrow::array::Float32Array),
        DataType::Float64 => build_primitive!(Float64Builder, arrow::array::Float64Array),
        DataType::Boolean => build_primitive!(BooleanBuilder, arrow::array::BooleanArray),
        DataType::Date32 => build_primitive!(Date32Builder, arrow::array::Date32Array),
        DataType::Utf8 => {
            let src = array
                .as_any()
                .downcast_ref::<arrow::array::StringArray>()
                .unwrap();
            let mut builder = StringBuilder::with_capacity(rows.len(), rows.len() * 16);
            for &row in rows {
                if src.is_null(row) {
                    builder.append_null();
                } else {
                    builder.append_value(src.value(row));
                }
            }
            Arc::new(builder.finish()) as ArrayRef
        }
        DataType::Binary => {
            let src = array
                .as_any()
                .downcast_ref::<arrow::array::BinaryArray>()
                .unwrap();
            let mut builder = BinaryBuilder::with_capacity(rows.len(), rows.len() * 16);
            for &row in rows {
                if src.is_null(row) {
                    builder.append_null();
                } else {
                    builder.append_value(src.value(row));
                }
            }
            Arc::new(builder.finish()) as ArrayRef
        }
        DataType::Timestamp(arrow::datatypes::TimeUnit::Microsecond, tz) => {
            let src = array
                .as_any()
                .downcast_ref::<arrow::array::TimestampMicrosecondArray>()
                .unwrap();
            let mut builder = TimestampMicrosecondBuilder::with_capacity(rows.len());
            for &row in rows {
                if src.is_null(row) {
                    builder.append_null();
                } else {
                    builder.append_value(src.value(row));
                }
            }
            let built = builder.finish();
            let built = match tz {
                Some(tz) => built.with_timezone(tz.clone()),
                None => built,
            };
            Arc::new(built) as ArrayRef
        }
        DataType::Decimal128(precision, scale) => {
            let src = array
                .as_any()
                .downcast_ref::<arrow::array::Decimal128Array>()
                .unwrap();
            let mut builder = Decimal128Builder::with_capacity(rows.len())
                .with_precision_and_scale(*precision, *scale)
                .map_err(arrow::error::ArrowError::from)?;
            for &row in rows {
                if src.is_null(row) {
                    builder.append_null();
                } else {
                    builder.append_value(src.value(row));
                }
            }
            Arc::new(builder.finish()) as ArrayRef
        }
        other => {
            return Err(StorageError::Arrow(arrow::error::ArrowError::SchemaError(
                format!("unsupported column type for filtered copy: {other:?}"),
            )))
        }
    };
    Ok(out)
}
