//! Query execution glue (spec §4.8): query-shaped inputs, the
//! `Solution`/`Binding` result shape, and the `Executor` that drives the
//! physical plan compiler and the transitive-path engine to answer them.

mod executor;
mod query;
mod solution;

pub use executor::Executor;
pub use query::{GraphQuery, PathKind, QueryOptions, Term, TransitivePattern, TriplePattern};
pub use solution::{Binding, Solution};
