//! Batch → row-map boundary conversion (spec §4.3), used where the
//! columnar world meets the per-solution `exec` layer (one row becomes
//! one binding set).

use arrow::array::Array;
use std::collections::HashMap;

use super::batch::Batch;
use super::value::ColumnValue;
use crate::storage::StorageError;

/// One row of a [`Batch`], as a column-name → value map. `None` for a
/// null cell.
pub type Row = HashMap<String, Option<ColumnValue>>;

/// Materialize every row of `batch` into a `Row` map. Column order is not
/// preserved (maps don't have one); use [`row_at`] directly on a batch
/// when only a handful of rows are needed.
pub fn batch_to_rows(batch: &Batch) -> Result<Vec<Row>, StorageError> {
    (0..batch.num_rows()).map(|row| row_at(batch, row)).collect()
}

/// Materialize a single row.
pub fn row_at(batch: &Batch, row: usize) -> Result<Row, StorageError> {
    let schema = batch.schema();
    let mut out = Row::with_capacity(batch.num_columns());
    for (col_idx, field) in schema.fields().iter().enumerate() {
        let array = batch.column(col_idx);
        let value = if array.is_null(row) {
            None
        } else {
            Some(ColumnValue::from_array(array, row)?)
        };
        out.insert(field.name().clone(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow_util::test_support::sample_batch;

    #[test]
    fn batch_to_rows_preserves_row_count_and_values() {
        let batch = Batch::from_record_batch(sample_batch());
        let rows = batch_to_rows(&batch).unwrap();
        assert_eq!(rows.len(), batch.num_rows());
        assert_eq!(rows[0].get("id").unwrap(), &Some(ColumnValue::Int32(1)));
    }
}
