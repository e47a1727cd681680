//! NDV (distinct-value) cardinality sketches (spec §3.1 "Statistics",
//! §6.5): a fixed-precision HyperLogLog plus optional loading from a
//! warehouse's `stats-sketches` directory.

mod hll;
mod sketch_store;

pub use hll::HyperLogLog;
pub use sketch_store::{SketchKind, SketchStore};
