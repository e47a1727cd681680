//! `PlanCompiler` (spec §4.6.5): turns a set of per-table pattern groups
//! plus a computed join order into a tree of physical operators.

use std::collections::HashMap;
use std::sync::Arc;

use super::filter::Filter;
use super::hash_join::HashJoin;
use super::plan::Plan;
use super::project::Project;
use super::scan::Scan;
use crate::arrow_util::Predicate;
use crate::error::{EngineError, EngineResult};
use crate::execution::ResourceLimits;
use crate::iceberg_source::{ScanOptions, Statistics, TableSource, TimeTravel};
use crate::planner::{plan_join_sequence, JoinGraph, JoinPlanStep};
use crate::storage::FileIO;

/// One table's worth of query patterns, bundled the way the compiler
/// wants to consume them (spec §4.6.5 "pattern_groups").
#[derive(Debug, Clone, Default)]
pub struct PatternGroup {
    pub table: String,
    /// Column-level predicates to push into this table's scan.
    pub predicates: Vec<Predicate>,
    /// Every column this group's patterns touch: value columns for bound
    /// predicates, subject-template columns (if the subject is shared
    /// with another pattern), and join-key columns are added by the
    /// compiler itself from the join graph.
    pub projected_columns: Vec<String>,
    /// Whether this table was introduced by an OPTIONAL group.
    pub optional: bool,
}

/// Compiler inputs (spec §4.6.5).
pub struct CompilerInput {
    pub sources: HashMap<String, Arc<TableSource>>,
    pub groups: Vec<PatternGroup>,
    pub join_graph: JoinGraph,
    pub stats_by_table: HashMap<String, Statistics>,
    pub time_travel: TimeTravel,
    pub copy_batches: bool,
    /// Final projection applied once at the root, after every join
    /// (spec step 5: "only materialize row maps at the root").
    pub output_columns: Option<Vec<String>>,
    pub limits: ResourceLimits,
}

/// A compiled plan plus a short textual render of the join order, for
/// debugging and the testable properties in spec §8.
pub struct CompileResult {
    pub plan: Box<dyn Plan>,
    pub explain: String,
}

pub struct PlanCompiler;

impl PlanCompiler {
    pub fn compile(file_io: FileIO, input: CompilerInput) -> EngineResult<CompileResult> {
        let CompilerInput {
            sources,
            groups,
            join_graph,
            stats_by_table,
            time_travel,
            copy_batches,
            output_columns,
            limits,
        } = input;

        if groups.is_empty() {
            return Err(EngineError::planning("no pattern groups to compile"));
        }

        let groups_by_table: HashMap<String, &PatternGroup> =
            groups.iter().map(|g| (g.table.clone(), g)).collect();
        let tables: Vec<String> = groups.iter().map(|g| g.table.clone()).collect();
        let predicates_by_table: HashMap<String, Vec<Predicate>> = groups
            .iter()
            .map(|g| (g.table.clone(), g.predicates.clone()))
            .collect();

        let steps = plan_join_sequence(
            &tables,
            &join_graph,
            &stats_by_table,
            &predicates_by_table,
            false,
        )?;

        let mut explain_lines = Vec::with_capacity(steps.len());
        let mut plan: Option<Box<dyn Plan>> = None;
        let mut chosen: Vec<String> = Vec::new();

        for step in &steps {
            match step {
                JoinPlanStep::Scan {
                    table,
                    estimated_rows,
                } => {
                    let scan = build_scan(
                        table,
                        &sources,
                        &groups_by_table,
                        &join_graph,
                        &file_io,
                        &time_travel,
                        copy_batches,
                    )?;
                    explain_lines.push(format!("Scan({table}) ~{estimated_rows} rows"));
                    chosen.push(table.clone());
                    plan = Some(Box::new(scan));
                }
                JoinPlanStep::HashJoin {
                    table,
                    edge_predicate_iri,
                    estimated_rows,
                } => {
                    let probe = plan.take().ok_or_else(|| {
                        EngineError::planning("join step produced before any scan was built")
                    })?;
                    let build = build_scan(
                        table,
                        &sources,
                        &groups_by_table,
                        &join_graph,
                        &file_io,
                        &time_travel,
                        copy_batches,
                    )?;

                    let (probe_keys, build_keys) =
                        resolve_join_keys(&join_graph, table, &chosen, edge_predicate_iri)?;

                    let left_outer = groups_by_table
                        .get(table)
                        .map(|g| g.optional)
                        .unwrap_or(false);

                    explain_lines.push(format!(
                        "HashJoin(+{table} on {edge_predicate_iri}, outer={left_outer}) ~{estimated_rows} rows"
                    ));

                    let join = HashJoin::new(
                        probe,
                        Box::new(build),
                        probe_keys,
                        build_keys,
                        left_outer,
                        None,
                        limits.clone(),
                    );
                    chosen.push(table.clone());
                    plan = Some(Box::new(join));
                }
            }
        }

        let mut plan = plan.ok_or_else(|| EngineError::planning("join sequence produced no plan"))?;
        if let Some(columns) = output_columns {
            explain_lines.push(format!("Project({})", columns.join(", ")));
            plan = Box::new(Project::new(plan, columns));
        }

        Ok(CompileResult {
            plan,
            explain: explain_lines.join("\n"),
        })
    }
}

fn build_scan(
    table: &str,
    sources: &HashMap<String, Arc<TableSource>>,
    groups_by_table: &HashMap<String, &PatternGroup>,
    join_graph: &JoinGraph,
    file_io: &FileIO,
    time_travel: &TimeTravel,
    copy_batches: bool,
) -> EngineResult<Scan> {
    let source = sources
        .get(table)
        .cloned()
        .ok_or_else(|| EngineError::schema(format!("no TableSource registered for table '{table}'")))?;
    let group = groups_by_table
        .get(table)
        .ok_or_else(|| EngineError::planning(format!("no pattern group for table '{table}'")))?;

    let mut columns = group.projected_columns.clone();
    for extra in join_columns_for_table(join_graph, table) {
        if !columns.contains(&extra) {
            columns.push(extra);
        }
    }

    let mut opts = ScanOptions::default()
        .with_columns(columns)
        .with_predicates(group.predicates.clone());
    opts.time_travel = time_travel.clone();
    opts.copy_batches = copy_batches;

    let scan = Scan::new(source, file_io.clone(), opts);
    Ok(scan)
}

/// Every column `table` contributes to some join edge in `graph`, so a
/// scan of `table` always has its key columns available regardless of
/// where in the join order it's introduced (spec §4.6.5 "pattern_groups":
/// "join-key columns are added by the compiler itself from the join
/// graph").
fn join_columns_for_table(graph: &JoinGraph, table: &str) -> Vec<String> {
    graph
        .edges_for(table)
        .flat_map(|edge| {
            if edge.child_table == table {
                edge.columns.iter().map(|(c, _)| c.clone()).collect::<Vec<_>>()
            } else {
                edge.columns.iter().map(|(_, p)| p.clone()).collect::<Vec<_>>()
            }
        })
        .collect()
}

/// Use the join graph to translate the edge connecting `new_table` to the
/// already-chosen side into `(probe_keys, build_keys)`, where `probe` is
/// the accumulated plan so far and `build` is `new_table`'s fresh scan.
fn resolve_join_keys(
    graph: &JoinGraph,
    new_table: &str,
    chosen: &[String],
    edge_predicate_iri: &str,
) -> EngineResult<(Vec<String>, Vec<String>)> {
    for edge in graph.edges_for(new_table) {
        if edge.predicate_iri != edge_predicate_iri {
            continue;
        }
        let other = if edge.child_table == new_table {
            &edge.parent_table
        } else {
            &edge.child_table
        };
        if !chosen.iter().any(|t| t == other) {
            continue;
        }
        let (probe_keys, build_keys) = if edge.child_table == new_table {
            // columns are (child_col, parent_col); new_table is the child.
            (
                edge.columns.iter().map(|(_, p)| p.clone()).collect(),
                edge.columns.iter().map(|(c, _)| c.clone()).collect(),
            )
        } else {
            (
                edge.columns.iter().map(|(c, _)| c.clone()).collect(),
                edge.columns.iter().map(|(_, p)| p.clone()).collect(),
            )
        };
        return Ok((probe_keys, build_keys));
    }
    Err(EngineError::planning(format!(
        "no join edge connects '{new_table}' to the already-planned tables"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::JoinEdge;

    fn single_edge_graph(child: &str, parent: &str, pred: &str) -> JoinGraph {
        let edge = JoinEdge {
            child_table: child.to_string(),
            parent_table: parent.to_string(),
            columns: vec![("airline_id".to_string(), "id".to_string())],
            predicate_iri: pred.to_string(),
        };
        let mut by_table: HashMap<String, Vec<usize>> = HashMap::new();
        by_table.insert(child.to_string(), vec![0]);
        by_table.insert(parent.to_string(), vec![0]);
        JoinGraph {
            edges: vec![edge],
            by_table,
            tm_to_table: HashMap::new(),
        }
    }

    #[test]
    fn resolves_keys_when_new_table_is_child() {
        let graph = single_edge_graph("routes", "airlines", "http://example.org/airline");
        let (probe_keys, build_keys) = resolve_join_keys(
            &graph,
            "routes",
            &["airlines".to_string()],
            "http://example.org/airline",
        )
        .unwrap();
        assert_eq!(probe_keys, vec!["id".to_string()]);
        assert_eq!(build_keys, vec!["airline_id".to_string()]);
    }

    #[test]
    fn errors_when_no_edge_reaches_chosen_tables() {
        let graph = JoinGraph::default();
        let err = resolve_join_keys(&graph, "routes", &["airlines".to_string()], "http://example.org/airline");
        assert!(err.is_err());
    }
}
