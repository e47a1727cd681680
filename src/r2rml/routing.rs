//! `RoutingIndex` (spec §3.1, §4.4): translates predicate IRIs into
//! tables, columns, and join edges.

use std::collections::HashMap;

use super::model::{ObjectMap, R2RMLMapping};

/// A predicate resolves to either a plain column on the mapping's table,
/// or a join edge into another mapping's table.
#[derive(Debug, Clone)]
pub enum PredicateTarget<'a> {
    Column {
        table: &'a str,
        column: &'a str,
        datatype: Option<&'a str>,
    },
    Join {
        child_table: &'a str,
        parent_table: &'a str,
        columns: Vec<(&'a str, &'a str)>,
    },
}

/// Precomputed lookup structures derived from a set of [`R2RMLMapping`]s
/// (spec §4.4 "RoutingIndex").
#[derive(Debug, Clone)]
pub struct RoutingIndex {
    mappings: Vec<R2RMLMapping>,
    predicate_to_mappings: HashMap<String, Vec<usize>>,
    triples_map_to_table: HashMap<String, String>,
}

impl RoutingIndex {
    pub fn build(mappings: Vec<R2RMLMapping>) -> Self {
        let mut predicate_to_mappings: HashMap<String, Vec<usize>> = HashMap::new();
        let mut triples_map_to_table = HashMap::new();

        for (idx, mapping) in mappings.iter().enumerate() {
            triples_map_to_table.insert(mapping.triples_map_id.clone(), mapping.table.clone());
            for predicate in mapping.predicates.keys() {
                predicate_to_mappings
                    .entry(predicate.clone())
                    .or_default()
                    .push(idx);
            }
        }

        RoutingIndex {
            mappings,
            predicate_to_mappings,
            triples_map_to_table,
        }
    }

    pub fn mappings(&self) -> &[R2RMLMapping] {
        &self.mappings
    }

    pub fn table_for_triples_map(&self, triples_map_id: &str) -> Option<&str> {
        self.triples_map_to_table.get(triples_map_id).map(String::as_str)
    }

    /// All mappings whose `predicates` map lists `predicate_iri` (spec
    /// invariant: the routing index never routes a predicate to a
    /// mapping that doesn't list it — satisfied by construction here).
    pub fn mappings_for_predicate(&self, predicate_iri: &str) -> Vec<&R2RMLMapping> {
        self.predicate_to_mappings
            .get(predicate_iri)
            .into_iter()
            .flatten()
            .map(|&idx| &self.mappings[idx])
            .collect()
    }

    /// Resolve `predicate_iri` against one specific mapping's table.
    pub fn resolve<'a>(
        &'a self,
        mapping: &'a R2RMLMapping,
        predicate_iri: &str,
    ) -> Option<PredicateTarget<'a>> {
        match mapping.predicates.get(predicate_iri)? {
            ObjectMap::Column { column, datatype } => Some(PredicateTarget::Column {
                table: &mapping.table,
                column,
                datatype: datatype.as_deref(),
            }),
            ObjectMap::Ref {
                parent_triples_map,
                join_conditions,
            } => {
                let parent_table = self.table_for_triples_map(parent_triples_map)?;
                let columns = join_conditions
                    .iter()
                    .map(|jc| (jc.child.as_str(), jc.parent.as_str()))
                    .collect();
                Some(PredicateTarget::Join {
                    child_table: &mapping.table,
                    parent_table,
                    columns,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r2rml::parse::parse_document;

    const DOC: &str = r#"
        @prefix rr: <http://www.w3.org/ns/r2rml#> .
        @prefix ex: <http://example.org/> .
        <#AirlinesMap>
          rr:logicalTable [ rr:tableName "airlines" ] ;
          rr:subjectMap [ rr:template "http://example.org/airlines/{id}" ] ;
          rr:predicateObjectMap [
            rr:predicate ex:country ;
            rr:objectMap [ rr:column "country" ]
          ] .
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
    fn resolves_column_and_join_predicates() {
        let mappings = parse_document(DOC).unwrap();
        let index = RoutingIndex::build(mappings);

        let country_mappings = index.mappings_for_predicate("http://example.org/country");
        assert_eq!(country_mappings.len(), 1);
        match index.resolve(country_mappings[0], "http://example.org/country") {
            Some(PredicateTarget::Column { column, .. }) => assert_eq!(column, "country"),
            other => panic!("expected column target, got {other:?}"),
        }

        let airline_mappings = index.mappings_for_predicate("http://example.org/airline");
        match index.resolve(airline_mappings[0], "http://example.org/airline") {
            Some(PredicateTarget::Join {
                child_table,
                parent_table,
                columns,
            }) => {
                assert_eq!(child_table, "routes");
                assert_eq!(parent_table, "airlines");
                assert_eq!(columns, vec![("airline_id", "id")]);
            }
            other => panic!("expected join target, got {other:?}"),
        }
    }

    #[test]
    fn unknown_predicate_routes_to_nothing() {
        let mappings = parse_document(DOC).unwrap();
        let index = RoutingIndex::build(mappings);
        assert!(index
            .mappings_for_predicate("http://example.org/nonexistent")
            .is_empty());
    }
}
