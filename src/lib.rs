//! # icegraph
//!
//! A read-only query engine over R2RML-mapped Apache Iceberg tables:
//! triple patterns and transitive property paths resolve directly against
//! Iceberg metadata and Arrow batches, with no intermediate RDF
//! materialization.
//!
//! ## Pipeline
//!
//! ```text
//! R2RML mapping document
//!     |  r2rml::parse_document
//!     v
//! RoutingIndex + JoinGraph           (r2rml::RoutingIndex, planner::JoinGraph)
//!     |
//! GraphQuery                         (exec::GraphQuery: triple + transitive patterns)
//!     |  exec::Executor::run
//!     v
//! PatternGroup(s) + greedy join order (planner::plan_join_sequence)
//!     |  physical::PlanCompiler::compile
//!     v
//! Scan / HashJoin / Project tree      (physical::Plan)
//!     |  pulled batch-by-batch over iceberg_source::TableSource
//!     v
//! Vec<exec::Solution>
//! ```
//!
//! ## Module map
//!
//! - [`storage`]: pluggable object store, block cache, seekable streams.
//! - [`iceberg_source`]: table metadata/schema/statistics, Arrow-batch scans.
//! - [`r2rml`]: mapping document parsing and predicate routing.
//! - [`planner`]: join graph construction and greedy join ordering.
//! - [`physical`]: the pull-based operator tree and its compiler.
//! - [`transitive`]: BFS resolution of `pred+`/`pred*` property paths.
//! - [`statistics`]: HyperLogLog NDV sketches, optionally persisted.
//! - [`exec`]: query-shaped inputs, `Solution` rows, the `Executor`.
//! - [`execution`]: resource limits, row tracking, cooperative cancellation.
//! - [`config`] / [`error`]: ambient configuration and error taxonomy.

pub mod arrow_util;
pub mod bloom_filter;
pub mod config;
pub mod error;
pub mod exec;
pub mod execution;
pub mod iceberg_source;
pub mod physical;
pub mod planner;
pub mod r2rml;
pub mod statistics;
pub mod storage;
pub mod transitive;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use exec::{Executor, GraphQuery};
