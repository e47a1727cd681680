//! R2RML data model (spec §3.1, §4.4): the parsed shape of a mapping
//! document, independent of its textual syntax.

use std::collections::HashMap;

/// One `rr:TriplesMap`.
#[derive(Debug, Clone, PartialEq)]
pub struct R2RMLMapping {
    pub table: String,
    pub triples_map_id: String,
    pub subject_template: String,
    pub subject_class: Option<String>,
    pub predicates: HashMap<String, ObjectMap>,
}

impl R2RMLMapping {
    /// The ordered column names referenced by `{col}` placeholders in the
    /// subject template, used both to materialize IRIs and to recover IDs
    /// from them (spec §4.4).
    pub fn template_columns(&self) -> Vec<String> {
        template_columns(&self.subject_template)
    }
}

/// Extract `{col}` placeholders from a template string in order.
pub fn template_columns(template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                out.push(after[..end].to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    out
}

/// Split a template into its literal segments around `{col}` placeholders,
/// e.g. `"http://ex.org/people/{id}"` -> `["http://ex.org/people/", ""]`.
fn template_segments(template: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut rest = template;
    loop {
        match rest.find('{') {
            Some(start) => {
                segments.push(&rest[..start]);
                let after = &rest[start + 1..];
                match after.find('}') {
                    Some(end) => rest = &after[end + 1..],
                    None => {
                        segments.push(rest);
                        return segments;
                    }
                }
            }
            None => {
                segments.push(rest);
                return segments;
            }
        }
    }
}

/// Substitute `values` (in template-column order) into `template`'s
/// placeholders to build a subject/object IRI (spec §4.7).
pub fn template_render(template: &str, values: &[String]) -> String {
    let segments = template_segments(template);
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        out.push_str(segment);
        if let Some(value) = values.get(i) {
            out.push_str(value);
        }
    }
    out
}

/// Inverse of [`template_render`]: recover the placeholder values from an
/// IRI built from this template, by matching the literal segments around
/// each placeholder. Returns `None` if `iri` doesn't match the template's
/// literal structure.
pub fn template_extract(template: &str, iri: &str) -> Option<Vec<String>> {
    let segments = template_segments(template);
    if segments.is_empty() {
        return None;
    }
    let mut rest = iri;
    let mut values = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        if i == 0 {
            rest = rest.strip_prefix(segment)?;
            continue;
        }
        if i == segments.len() - 1 {
            let value = rest.strip_suffix(segment)?;
            values.push(value.to_string());
            return Some(values);
        }
        let idx = rest.find(segment)?;
        values.push(rest[..idx].to_string());
        rest = &rest[idx + segment.len()..];
    }
    Some(values)
}

/// The object side of a `predicateObjectMap`.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMap {
    /// A column mapping: the object is a literal drawn directly from a
    /// column value.
    Column {
        column: String,
        datatype: Option<String>,
    },
    /// A reference mapping: the object is the subject IRI of another
    /// triples map, joined via the given column pairs.
    Ref {
        parent_triples_map: String,
        join_conditions: Vec<JoinCondition>,
    },
}

/// One `child`/`parent` column pair in an `rr:joinCondition`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub child: String,
    pub parent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_template_column() {
        assert_eq!(
            template_columns("http://example.org/airlines/{id}"),
            vec!["id".to_string()]
        );
    }

    #[test]
    fn extracts_multiple_template_columns() {
        assert_eq!(
            template_columns("http://example.org/routes/{src}/{dst}"),
            vec!["src".to_string(), "dst".to_string()]
        );
    }

    #[test]
    fn no_placeholders_yields_empty() {
        assert!(template_columns("http://example.org/static").is_empty());
    }

    #[test]
    fn render_and_extract_round_trip_single_placeholder() {
        let template = "http://example.org/airlines/{id}";
        let iri = template_render(template, &["42".to_string()]);
        assert_eq!(iri, "http://example.org/airlines/42");
        assert_eq!(template_extract(template, &iri), Some(vec!["42".to_string()]));
    }

    #[test]
    fn render_and_extract_round_trip_multi_placeholder() {
        let template = "http://example.org/routes/{src}/{dst}";
        let iri = template_render(template, &["JFK".to_string(), "LAX".to_string()]);
        assert_eq!(iri, "http://example.org/routes/JFK/LAX");
        assert_eq!(
            template_extract(template, &iri),
            Some(vec!["JFK".to_string(), "LAX".to_string()])
        );
    }

    #[test]
    fn extract_rejects_non_matching_iri() {
        let template = "http://example.org/airlines/{id}";
        assert_eq!(template_extract(template, "http://example.org/routes/42"), None);
    }
}
