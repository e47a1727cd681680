//! Join graph construction and greedy, cost-based join ordering (spec §4.5).

mod cost;
mod graph;
mod order;

pub use cost::{edge_cardinality, join_cardinality, predicate_selectivity, selected_rows};
pub use graph::{JoinEdge, JoinGraph};
pub use order::{plan_join_sequence, JoinPlanStep};
