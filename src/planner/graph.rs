//! `JoinGraph` construction (spec §3.1, §4.5.1).

use std::collections::HashMap;

use crate::r2rml::RoutingIndex;

/// One join between two tables, derived from a reference `ObjectMap`
/// (spec §3.1 "JoinGraph"). `columns` holds child/parent pairs; composite
/// keys are multi-element.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinEdge {
    pub child_table: String,
    pub parent_table: String,
    pub columns: Vec<(String, String)>,
    pub predicate_iri: String,
}

#[derive(Debug, Clone, Default)]
pub struct JoinGraph {
    pub edges: Vec<JoinEdge>,
    pub by_table: HashMap<String, Vec<usize>>,
    pub tm_to_table: HashMap<String, String>,
}

impl JoinGraph {
    pub fn build(routing: &RoutingIndex) -> JoinGraph {
        let mut edges = Vec::new();
        let mut by_table: HashMap<String, Vec<usize>> = HashMap::new();
        let mut tm_to_table = HashMap::new();

        for mapping in routing.mappings() {
            tm_to_table.insert(mapping.triples_map_id.clone(), mapping.table.clone());
            for predicate_iri in mapping.predicates.keys() {
                if let Some(crate::r2rml::PredicateTarget::Join {
                    child_table,
                    parent_table,
                    columns,
                }) = routing.resolve(mapping, predicate_iri)
                {
                    let idx = edges.len();
                    edges.push(JoinEdge {
                        child_table: child_table.to_string(),
                        parent_table: parent_table.to_string(),
                        columns: columns
                            .iter()
                            .map(|(c, p)| (c.to_string(), p.to_string()))
                            .collect(),
                        predicate_iri: predicate_iri.clone(),
                    });
                    by_table.entry(child_table.to_string()).or_default().push(idx);
                    by_table.entry(parent_table.to_string()).or_default().push(idx);
                }
            }
        }

        JoinGraph {
            edges,
            by_table,
            tm_to_table,
        }
    }

    pub fn edges_for(&self, table: &str) -> impl Iterator<Item = &JoinEdge> {
        self.by_table
            .get(table)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// The other endpoint of an edge touching `table`, if any.
    pub fn neighbor<'a>(&'a self, edge: &'a JoinEdge, table: &str) -> Option<&'a str> {
        if edge.child_table == table {
            Some(&edge.parent_table)
        } else if edge.parent_table == table {
            Some(&edge.child_table)
        } else {
            None
        }
    }

    pub fn is_joinable(&self, table: &str, chosen: &std::collections::HashSet<String>) -> bool {
        self.edges_for(table)
            .any(|edge| chosen.contains(&edge.child_table) || chosen.contains(&edge.parent_table))
    }
}
