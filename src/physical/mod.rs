//! Physical operator tree (spec §4.6): pull-based `Plan` implementations
//! plus the compiler that assembles them from a query's pattern groups
//! and computed join order.

mod compiler;
mod filter;
mod hash_join;
mod plan;
mod project;
mod scan;

pub use compiler::{CompileResult, CompilerInput, PatternGroup, PlanCompiler};
pub use filter::Filter;
pub use hash_join::HashJoin;
pub use plan::Plan;
pub use project::Project;
pub use scan::Scan;
