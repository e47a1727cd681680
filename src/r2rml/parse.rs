//! R2RML document parser (spec §4.4, §6.4).
//!
//! Handles the minimum required vocabulary: `@prefix`, `rr:TriplesMap`
//! subjects, `rr:logicalTable`/`rr:tableName`, `rr:subjectMap` with
//! `rr:template`/`rr:class`, and `rr:predicateObjectMap` with either a
//! column `rr:objectMap` or a reference `rr:objectMap` carrying
//! `rr:parentTriplesMap`/`rr:joinCondition`. This is a line-oriented
//! subset of Turtle, not a general RDF parser: it assumes one statement
//! (triples map) per `subject [ ... ] .` block and bracketed blank nodes
//! for nested maps, which is how R2RML documents are conventionally
//! written.

use std::collections::HashMap;

use super::model::{JoinCondition, ObjectMap, R2RMLMapping};

#[derive(Debug, thiserror::Error)]
pub enum R2RMLError {
    #[error("unknown prefix '{prefix}' at {location}")]
    UnknownPrefix { prefix: String, location: String },

    #[error("missing rr:tableName in triples map '{triples_map}'")]
    MissingTableName { triples_map: String },

    #[error("missing rr:subjectMap in triples map '{triples_map}'")]
    MissingSubjectMap { triples_map: String },

    #[error("missing rr:template in subject map for '{triples_map}'")]
    MissingTemplate { triples_map: String },

    #[error("join condition arity mismatch in '{triples_map}': {child_count} child columns vs {parent_count} parent columns")]
    JoinArityMismatch {
        triples_map: String,
        child_count: usize,
        parent_count: usize,
    },

    #[error("malformed document near: {snippet}")]
    Malformed { snippet: String },
}

/// Parse an R2RML document into its constituent `R2RMLMapping`s.
pub fn parse_document(source: &str) -> Result<Vec<R2RMLMapping>, R2RMLError> {
    let mut prefixes = HashMap::new();
    let mut mappings = Vec::new();

    for block in split_statements(source) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        if let Some(rest) = block.strip_prefix("@prefix") {
            let (prefix, iri) = parse_prefix_decl(rest)?;
            prefixes.insert(prefix, iri);
            continue;
        }
        mappings.push(parse_triples_map(block, &prefixes)?);
    }

    Ok(mappings)
}

/// Split on top-level `.` terminators, respecting `[...]` nesting and
/// quoted strings so a literal containing `.` or `]` doesn't split early.
fn split_statements(source: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '#' if !in_string && depth == 0 => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                current.push('\n');
            }
            '"' => {
                in_string = !in_string;
                current.push(c);
            }
            '[' if !in_string => {
                depth += 1;
                current.push(c);
            }
            ']' if !in_string => {
                depth -= 1;
                current.push(c);
            }
            '.' if !in_string && depth == 0 => {
                statements.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        statements.push(current);
    }
    statements
}

fn parse_prefix_decl(rest: &str) -> Result<(String, String), R2RMLError> {
    let rest = rest.trim();
    let colon = rest.find(':').ok_or_else(|| R2RMLError::Malformed {
        snippet: rest.to_string(),
    })?;
    let prefix = rest[..colon].trim().to_string();
    let iri_part = rest[colon + 1..].trim();
    let iri = extract_angle_bracketed(iri_part).ok_or_else(|| R2RMLError::Malformed {
        snippet: iri_part.to_string(),
    })?;
    Ok((prefix, iri))
}

fn extract_angle_bracketed(text: &str) -> Option<String> {
    let start = text.find('<')?;
    let end = text[start..].find('>')? + start;
    Some(text[start + 1..end].to_string())
}

fn resolve_iri(token: &str, prefixes: &HashMap<String, String>) -> Result<String, R2RMLError> {
    let token = token.trim();
    if let Some(iri) = extract_angle_bracketed(token) {
        return Ok(iri);
    }
    let colon = token.find(':').ok_or_else(|| R2RMLError::Malformed {
        snippet: token.to_string(),
    })?;
    let prefix = &token[..colon];
    let local = &token[colon + 1..];
    let base = prefixes
        .get(prefix)
        .ok_or_else(|| R2RMLError::UnknownPrefix {
            prefix: prefix.to_string(),
            location: token.to_string(),
        })?;
    Ok(format!("{base}{local}"))
}

fn extract_quoted(text: &str) -> Option<String> {
    let start = text.find('"')?;
    let rest = &text[start + 1..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Pull the contents of the first top-level `[...]` block out of `text`.
fn extract_bracketed(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0i32;
    for (offset, c) in text[start..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start + 1..start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a `[...]` block's body on top-level `;` separators.
fn split_clauses(body: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut start = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '[' if !in_string => depth += 1,
            ']' if !in_string => depth -= 1,
            ';' if !in_string && depth == 0 => {
                out.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = body[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn parse_triples_map(
    block: &str,
    prefixes: &HashMap<String, String>,
) -> Result<R2RMLMapping, R2RMLError> {
    let mut chars = block.char_indices();
    let subject_end = chars
        .by_ref()
        .skip_while(|(_, c)| c.is_whitespace())
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(block.len());
    let triples_map_id = block[..subject_end].trim().to_string();
    let rest = &block[subject_end..];

    let mut table_name = None;
    let mut subject_template = None;
    let mut subject_class = None;
    let mut predicates = HashMap::new();

    for clause in split_clauses(rest) {
        let clause = clause.trim();
        if let Some(body) = clause.strip_prefix("rr:logicalTable") {
            let bracket = extract_bracketed(body).ok_or_else(|| R2RMLError::Malformed {
                snippet: body.to_string(),
            })?;
            for inner in split_clauses(bracket) {
                if let Some(rest) = inner.strip_prefix("rr:tableName") {
                    table_name = extract_quoted(rest);
                }
            }
        } else if let Some(body) = clause.strip_prefix("rr:subjectMap") {
            let bracket = extract_bracketed(body).ok_or_else(|| R2RMLError::Malformed {
                snippet: body.to_string(),
            })?;
            for inner in split_clauses(bracket) {
                if let Some(rest) = inner.strip_prefix("rr:template") {
                    subject_template = extract_quoted(rest);
                } else if let Some(rest) = inner.strip_prefix("rr:class") {
                    subject_class = Some(resolve_iri(rest.trim(), prefixes)?);
                }
            }
        } else if let Some(body) = clause.strip_prefix("rr:predicateObjectMap") {
            let bracket = extract_bracketed(body).ok_or_else(|| R2RMLError::Malformed {
                snippet: body.to_string(),
            })?;
            let (predicate_iri, object_map) =
                parse_predicate_object_map(bracket, &triples_map_id, prefixes)?;
            predicates.insert(predicate_iri, object_map);
        }
    }

    let table = table_name.ok_or_else(|| R2RMLError::MissingTableName {
        triples_map: triples_map_id.clone(),
    })?;
    let subject_template = subject_template.ok_or_else(|| R2RMLError::MissingTemplate {
        triples_map: triples_map_id.clone(),
    })?;

    Ok(R2RMLMapping {
        table,
        triples_map_id,
        subject_template,
        subject_class,
        predicates,
    })
}

fn parse_predicate_object_map(
    body: &str,
    triples_map_id: &str,
    prefixes: &HashMap<String, String>,
) -> Result<(String, ObjectMap), R2RMLError> {
    let mut predicate = None;
    let mut object_map = None;

    for clause in split_clauses(body) {
        if let Some(rest) = clause.strip_prefix("rr:predicate") {
            predicate = Some(resolve_iri(rest.trim(), prefixes)?);
        } else if let Some(rest) = clause.strip_prefix("rr:objectMap") {
            let bracket = extract_bracketed(rest).ok_or_else(|| R2RMLError::Malformed {
                snippet: rest.to_string(),
            })?;
            object_map = Some(parse_object_map(bracket, triples_map_id, prefixes)?);
        }
    }

    let predicate = predicate.ok_or_else(|| R2RMLError::Malformed {
        snippet: body.to_string(),
    })?;
    let object_map = object_map.ok_or_else(|| R2RMLError::Malformed {
        snippet: body.to_string(),
    })?;
    Ok((predicate, object_map))
}

fn parse_object_map(
    body: &str,
    triples_map_id: &str,
    prefixes: &HashMap<String, String>,
) -> Result<ObjectMap, R2RMLError> {
    let mut column = None;
    let mut datatype = None;
    let mut parent_triples_map = None;
    let mut join_children = Vec::new();
    let mut join_parents = Vec::new();

    for clause in split_clauses(body) {
        if let Some(rest) = clause.strip_prefix("rr:column") {
            column = extract_quoted(rest);
        } else if let Some(rest) = clause.strip_prefix("rr:datatype") {
            datatype = Some(resolve_iri(rest.trim(), prefixes)?);
        } else if let Some(rest) = clause.strip_prefix("rr:parentTriplesMap") {
            parent_triples_map = Some(rest.trim().to_string());
        } else if let Some(rest) = clause.strip_prefix("rr:joinCondition") {
            let bracket = extract_bracketed(rest).ok_or_else(|| R2RMLError::Malformed {
                snippet: rest.to_string(),
            })?;
            for inner in split_clauses(bracket) {
                if let Some(rest) = inner.strip_prefix("rr:child") {
                    if let Some(col) = extract_quoted(rest) {
                        join_children.push(col);
                    }
                } else if let Some(rest) = inner.strip_prefix("rr:parent") {
                    if let Some(col) = extract_quoted(rest) {
                        join_parents.push(col);
                    }
                }
            }
        }
    }

    if let Some(parent_triples_map) = parent_triples_map {
        if join_children.len() != join_parents.len() {
            return Err(R2RMLError::JoinArityMismatch {
                triples_map: triples_map_id.to_string(),
                child_count: join_children.len(),
                parent_count: join_parents.len(),
            });
        }
        let join_conditions = join_children
            .into_iter()
            .zip(join_parents)
            .map(|(child, parent)| JoinCondition { child, parent })
            .collect();
        return Ok(ObjectMap::Ref {
            parent_triples_map,
            join_conditions,
        });
    }

    let column = column.ok_or_else(|| R2RMLError::Malformed {
        snippet: body.to_string(),
    })?;
    Ok(ObjectMap::Column { column, datatype })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        @prefix rr: <http://www.w3.org/ns/r2rml#> .
        @prefix ex: <http://example.org/> .

        <#AirlinesMap>
          rr:logicalTable [ rr:tableName "airlines" ] ;
          rr:subjectMap [ rr:template "http://example.org/airlines/{id}" ; rr:class ex:Airline ] ;
          rr:predicateObjectMap [
            rr:predicate ex:name ;
            rr:objectMap [ rr:column "name" ]
          ] ;
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
    fn parses_column_and_reference_mappings() {
        let mappings = parse_document(DOC).unwrap();
        assert_eq!(mappings.len(), 2);

        let airlines = mappings.iter().find(|m| m.table == "airlines").unwrap();
        assert_eq!(airlines.subject_template, "http://example.org/airlines/{id}");
        assert_eq!(
            airlines.subject_class.as_deref(),
            Some("http://example.org/Airline")
        );
        assert!(matches!(
            airlines.predicates.get("http://example.org/name"),
            Some(ObjectMap::Column { column, .. }) if column == "name"
        ));

        let routes = mappings.iter().find(|m| m.table == "routes").unwrap();
        match routes.predicates.get("http://example.org/airline") {
            Some(ObjectMap::Ref {
                parent_triples_map,
                join_conditions,
            }) => {
                assert_eq!(parent_triples_map, "<#AirlinesMap>");
                assert_eq!(join_conditions.len(), 1);
                assert_eq!(join_conditions[0].child, "airline_id");
                assert_eq!(join_conditions[0].parent, "id");
            }
            other => panic!("expected reference mapping, got {other:?}"),
        }
    }

    #[test]
    fn missing_table_name_errors() {
        let doc = r#"
            @prefix rr: <http://www.w3.org/ns/r2rml#> .
            @prefix ex: <http://example.org/> .
            <#Bad>
              rr:subjectMap [ rr:template "http://example.org/{id}" ] .
        "#;
        let err = parse_document(doc).unwrap_err();
        assert!(matches!(err, R2RMLError::MissingTableName { .. }));
    }

    #[test]
    fn unknown_prefix_errors() {
        let doc = r#"
            @prefix rr: <http://www.w3.org/ns/r2rml#> .
            <#Bad>
              rr:logicalTable [ rr:tableName "t" ] ;
              rr:subjectMap [ rr:template "http://example.org/{id}" ; rr:class nope:Thing ] .
        "#;
        let err = parse_document(doc).unwrap_err();
        assert!(matches!(err, R2RMLError::UnknownPrefix { .. }));
    }
}
