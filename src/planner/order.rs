//! Greedy join ordering (spec §4.5.4, §4.5.5).

use std::collections::{HashMap, HashSet};

use crate::arrow_util::Predicate;
use crate::error::{EngineError, EngineResult};
use crate::iceberg_source::Statistics;
use crate::planner::cost::{edge_cardinality, selected_rows};
use crate::planner::graph::JoinGraph;

/// One step of a planned join sequence (spec §3.1 "JoinPlanStep").
#[derive(Debug, Clone)]
pub enum JoinPlanStep {
    Scan {
        table: String,
        estimated_rows: u64,
    },
    HashJoin {
        /// Table newly introduced at this step (the side being joined in).
        table: String,
        edge_predicate_iri: String,
        estimated_rows: u64,
    },
}

impl JoinPlanStep {
    pub fn estimated_rows(&self) -> u64 {
        match self {
            JoinPlanStep::Scan { estimated_rows, .. } => *estimated_rows,
            JoinPlanStep::HashJoin { estimated_rows, .. } => *estimated_rows,
        }
    }
}

/// Greedily order `tables` for a multi-pattern query (spec §4.5.4).
/// `allow_cartesian` controls step 3 of the algorithm: when `false`, a
/// disconnected remainder raises `PlanningError` instead of falling back
/// to a Cartesian step.
pub fn plan_join_sequence(
    tables: &[String],
    graph: &JoinGraph,
    stats_by_table: &HashMap<String, Statistics>,
    predicates_by_table: &HashMap<String, Vec<Predicate>>,
    allow_cartesian: bool,
) -> EngineResult<Vec<JoinPlanStep>> {
    if tables.is_empty() {
        return Ok(Vec::new());
    }

    let selected = |table: &str| -> u64 {
        let stats = stats_by_table.get(table).cloned().unwrap_or_default();
        let preds = predicates_by_table.get(table).cloned().unwrap_or_default();
        selected_rows(&preds, &stats)
    };

    let mut remaining: HashSet<String> = tables.iter().cloned().collect();
    let mut chosen: HashSet<String> = HashSet::new();
    let mut steps = Vec::new();

    // Step 1: smallest selected-rows among tables with at least one edge
    // into another table in the full set; if none qualify, smallest
    // overall (a single-table query has no edges to require).
    let first = remaining
        .iter()
        .filter(|t| graph.edges_for(t).any(|e| tables.contains(&e.child_table) || tables.contains(&e.parent_table)))
        .min_by_key(|t| selected(t))
        .or_else(|| remaining.iter().min_by_key(|t| selected(t)))
        .cloned()
        .expect("tables is non-empty");

    steps.push(JoinPlanStep::Scan {
        table: first.clone(),
        estimated_rows: selected(&first),
    });
    remaining.remove(&first);
    chosen.insert(first);
    let mut running_rows = steps[0].estimated_rows();

    while !remaining.is_empty() {
        let joinable: Vec<&String> = remaining
            .iter()
            .filter(|t| graph.is_joinable(t, &chosen))
            .collect();

        let next = if !joinable.is_empty() {
            joinable
                .into_iter()
                .min_by_key(|t| {
                    let edge = graph
                        .edges_for(t)
                        .find(|e| chosen.contains(&e.child_table) || chosen.contains(&e.parent_table));
                    let est = edge
                        .map(|e| {
                            let other = if chosen.contains(&e.child_table) {
                                &e.child_table
                            } else {
                                &e.parent_table
                            };
                            let other_stats = stats_by_table.get(other).cloned().unwrap_or_default();
                            let t_stats = stats_by_table.get(t.as_str()).cloned().unwrap_or_default();
                            edge_cardinality(e, &t_stats, &other_stats)
                        })
                        .unwrap_or_else(|| running_rows.saturating_mul(selected(t)));
                    (est, selected(t))
                })
                .cloned()
        } else if allow_cartesian {
            remaining.iter().min_by_key(|t| selected(t)).cloned()
        } else {
            return Err(EngineError::planning(format!(
                "disconnected join graph: no edge connects {:?} to the chosen tables {:?}",
                remaining, chosen
            )));
        };

        let table = next.expect("remaining is non-empty");
        let edge_predicate_iri = graph
            .edges_for(&table)
            .find(|e| chosen.contains(&e.child_table) || chosen.contains(&e.parent_table))
            .map(|e| e.predicate_iri.clone())
            .unwrap_or_default();

        let step_rows = running_rows.saturating_mul(selected(&table)).max(1);
        steps.push(JoinPlanStep::HashJoin {
            table: table.clone(),
            edge_predicate_iri,
            estimated_rows: step_rows,
        });
        running_rows = step_rows;
        remaining.remove(&table);
        chosen.insert(table);
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r2rml::{parse_document, RoutingIndex};

    const DOC: &str = r#"
        @prefix rr: <http://www.w3.org/ns/r2rml#> .
        @prefix ex: <http://example.org/> .
        <#AirlinesMap>
          rr:logicalTable [ rr:tableName "airlines" ] ;
          rr:subjectMap [ rr:template "http://example.org/airlines/{id}" ] .
        <#RoutesMap>
          rr:logicalTable [ rr:tableName "routes" ] ;
          rr:subjectMap [ rr:template "http://example.org/routes/{id}" ] ;
          rr:predicateObjectMap [
            rr:predicate ex:airline ;
            rr:objectMap [
              rr:parentTriplesMap <#AirlinesMap> ;
              rr:joinCondition [ rr:child "airline_id" ; rr:parent "id" ]
            ]
          ] .
    "#;

    #[test]
    fn smallest_connected_table_goes_first() {
        let routing = RoutingIndex::build(parse_document(DOC).unwrap());
        let graph = JoinGraph::build(&routing);
        let mut stats = HashMap::new();
        stats.insert(
            "airlines".to_string(),
            Statistics {
                row_count: 6162,
                ..Default::default()
            },
        );
        stats.insert(
            "routes".to_string(),
            Statistics {
                row_count: 67663,
                ..Default::default()
            },
        );

        let tables = vec!["routes".to_string(), "airlines".to_string()];
        let steps = plan_join_sequence(&tables, &graph, &stats, &HashMap::new(), false).unwrap();
        match &steps[0] {
            JoinPlanStep::Scan { table, .. } => assert_eq!(table, "airlines"),
            other => panic!("expected Scan first, got {other:?}"),
        }
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn disconnected_tables_error_without_cartesian_fallback() {
        let routing = RoutingIndex::build(parse_document(DOC).unwrap());
        let graph = JoinGraph::build(&routing);
        let tables = vec!["airlines".to_string(), "unrelated_table".to_string()];
        let result = plan_join_sequence(&tables, &graph, &HashMap::new(), &HashMap::new(), false);
        assert!(result.is_err());
    }
}
