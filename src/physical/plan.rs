//! The physical operator interface (spec §4.6): a pull-based tree where
//! each parent drives its children's `next_batch` until exhaustion.

use crate::arrow_util::Batch;
use crate::error::EngineResult;
use crate::iceberg_source::Schema;

/// A physical operator. `open`/`close` bracket one execution; `close`
/// must be idempotent and safe on a partially-consumed operator (spec §5,
/// testable property 14).
pub trait Plan: Send {
    fn open(&mut self) -> EngineResult<()>;

    /// The next batch, or `None` at end of input.
    fn next_batch(&mut self) -> EngineResult<Option<Batch>>;

    fn close(&mut self) -> EngineResult<()>;

    fn estimated_rows(&self) -> u64;

    fn schema(&self) -> Schema;
}
