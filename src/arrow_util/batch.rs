//! Owned columnar batch (spec §3.1 "Batch").
//!
//! A thin wrapper over `arrow::record_batch::RecordBatch` that documents
//! and enforces the invariants spec.md requires: fixed row count, every
//! column sharing that row count, and (when constructed via
//! [`crate::arrow_util::filter::filter_arrow_batch`] with `copy=true`)
//! storage independent of any upstream iterator state.

use arrow::array::ArrayRef;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// An owned, row-count-consistent columnar batch.
#[derive(Debug, Clone)]
pub struct Batch {
    inner: RecordBatch,
}

impl Batch {
    pub fn from_record_batch(inner: RecordBatch) -> Self {
        Batch { inner }
    }

    pub fn schema(&self) -> SchemaRef {
        self.inner.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.inner.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.inner.num_columns()
    }

    pub fn column(&self, index: usize) -> &ArrayRef {
        self.inner.column(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ArrayRef> {
        self.inner
            .schema()
            .index_of(name)
            .ok()
            .map(|idx| self.inner.column(idx))
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.inner
    }

    pub fn into_record_batch(self) -> RecordBatch {
        self.inner
    }

    /// Project to a subset of columns, by name, preserving order. A
    /// no-op clone (cheap: `RecordBatch` columns are `Arc`-shared) when
    /// `columns` is already exactly the batch's schema.
    pub fn project(&self, columns: &[String]) -> Result<Batch, arrow::error::ArrowError> {
        if columns.len() == self.num_columns()
            && columns
                .iter()
                .zip(self.inner.schema().fields())
                .all(|(name, field)| name == field.name())
        {
            return Ok(self.clone());
        }
        let indices: Result<Vec<usize>, _> = columns
            .iter()
            .map(|name| {
                self.inner.schema().index_of(name).map_err(|_| {
                    arrow::error::ArrowError::SchemaError(format!("unknown column: {name}"))
                })
            })
            .collect();
        let indices = indices?;
        let projected_schema = Arc::new(self.inner.schema().project(&indices)?);
        let projected_columns: Vec<ArrayRef> = indices
            .iter()
            .map(|&i| Arc::clone(self.inner.column(i)))
            .collect();
        let rb = RecordBatch::try_new(projected_schema, projected_columns)?;
        Ok(Batch::from_record_batch(rb))
    }
}

impl From<RecordBatch> for Batch {
    fn from(rb: RecordBatch) -> Self {
        Batch::from_record_batch(rb)
    }
}
