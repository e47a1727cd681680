//! Arrow batch utilities (spec §4.3): the owned [`Batch`] wrapper, the
//! enumerated [`ColumnValue`] type, predicate evaluation, and filtered
//! copy/zero-copy batch construction.

mod batch;
mod filter;
mod predicate;
mod rows;
#[cfg(test)]
mod test_support;
mod value;

pub use batch::Batch;
pub use filter::filter_arrow_batch;
pub use predicate::{eval_predicate, referenced_columns, Predicate, PreparedPredicate};
pub use rows::{batch_to_rows, row_at, Row};
pub use value::ColumnValue;
