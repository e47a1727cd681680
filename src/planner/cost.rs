//! Cardinality and selectivity estimation (spec §4.5.2, §4.5.3).

use crate::arrow_util::Predicate;
use crate::iceberg_source::Statistics;
use crate::planner::graph::JoinEdge;

/// Selectivity of one predicate against a table's stats (spec §4.5.3).
/// Heuristic constants are tunable (spec §9 Open Questions) without
/// changing correctness.
pub fn predicate_selectivity(predicate: &Predicate, stats: &Statistics) -> f64 {
    match predicate {
        Predicate::Eq { column, .. } | Predicate::Ne { column, .. } => {
            1.0 / stats.ndv(column) as f64
        }
        Predicate::In { column, values } => (values.len() as f64 / stats.ndv(column) as f64).min(1.0),
        Predicate::Gt { .. }
        | Predicate::Gte { .. }
        | Predicate::Lt { .. }
        | Predicate::Lte { .. }
        | Predicate::Between { .. } => 0.3,
        Predicate::IsNull { .. } => 0.1,
        Predicate::NotNull { .. } => 0.9,
        Predicate::And { children } => children
            .iter()
            .map(|c| predicate_selectivity(c, stats))
            .product(),
        Predicate::Or { children } => {
            1.0 - children
                .iter()
                .map(|c| 1.0 - predicate_selectivity(c, stats))
                .product::<f64>()
        }
    }
}

/// Composed selectivity across every predicate on one table, bounded
/// `selected_rows ∈ [1, row_count]` (spec §4.5.3).
pub fn selected_rows(predicates: &[Predicate], stats: &Statistics) -> u64 {
    if stats.row_count == 0 {
        return 0;
    }
    let combined: f64 = predicates
        .iter()
        .map(|p| predicate_selectivity(p, stats))
        .product();
    let estimate = (stats.row_count as f64 * combined).round() as u64;
    estimate.clamp(1, stats.row_count)
}

/// Estimated join cardinality (spec §4.5.2): `(rows_a * rows_b) /
/// max(ndv_a, ndv_b)`, clamped to at least 1.
pub fn join_cardinality(
    rows_a: u64,
    ndv_a: u64,
    rows_b: u64,
    ndv_b: u64,
) -> u64 {
    let denom = ndv_a.max(ndv_b).max(1);
    ((rows_a as u128 * rows_b as u128) / denom as u128)
        .max(1)
        .min(u64::MAX as u128) as u64
}

pub fn edge_cardinality(edge: &JoinEdge, child_stats: &Statistics, parent_stats: &Statistics) -> u64 {
    let (child_col, parent_col) = match edge.columns.first() {
        Some(pair) => pair,
        None => return child_stats.row_count.max(parent_stats.row_count).max(1),
    };
    join_cardinality(
        child_stats.row_count,
        child_stats.ndv(child_col),
        parent_stats.row_count,
        parent_stats.ndv(parent_col),
    )
}
