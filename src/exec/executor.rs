//! `Executor` (spec §4.8): translates a [`GraphQuery`] into a
//! [`PlanCompiler`] input via the routing index, runs the compiled plan,
//! resolves transitive patterns through [`TransitivePathEngine`], and
//! converts everything at the boundary into [`Solution`] rows.

use std::collections::HashMap;
use std::sync::Arc;

use crate::arrow_util::{batch_to_rows, ColumnValue, Predicate};
use crate::error::{EngineError, EngineResult};
use crate::execution::{QueryTimeout, ResourceLimits};
use crate::iceberg_source::{LogicalType, Schema, TableSource};
use crate::physical::{CompilerInput, PatternGroup, Plan, PlanCompiler};
use crate::planner::JoinGraph;
use crate::r2rml::{template_columns, template_extract, template_render, PredicateTarget, R2RMLMapping, RoutingIndex};
use crate::storage::FileIO;
use crate::transitive::TransitivePathEngine;

use super::query::{GraphQuery, PathKind, QueryOptions, Term, TransitivePattern, TriplePattern};
use super::solution::{Binding, Solution};

/// How a query variable is bound to the compiled plan's row shape: either
/// the subject IRI of a mapped table (reconstructed from its id
/// column(s)), or a plain literal column.
#[derive(Debug, Clone)]
enum VariableBinding {
    Subject {
        subject_template: String,
        id_columns: Vec<String>,
    },
    Literal {
        column: String,
        datatype: Option<String>,
    },
}

/// Ties the pieces built elsewhere in the crate into one query-answering
/// surface: the routing index (R2RML), the join graph (planner), the
/// table sources (Iceberg), and the transitive-path engine.
pub struct Executor {
    file_io: FileIO,
    routing: RoutingIndex,
    join_graph: JoinGraph,
    sources: HashMap<String, Arc<TableSource>>,
    depth_limit: u32,
    copy_batches: bool,
    limits: ResourceLimits,
    timeout: QueryTimeout,
}

impl Executor {
    pub fn new(
        file_io: FileIO,
        routing: RoutingIndex,
        join_graph: JoinGraph,
        sources: HashMap<String, Arc<TableSource>>,
        depth_limit: u32,
        copy_batches: bool,
        limits: ResourceLimits,
    ) -> Self {
        Executor {
            file_io,
            routing,
            join_graph,
            sources,
            depth_limit,
            copy_batches,
            limits,
            timeout: QueryTimeout::infinite(),
        }
    }

    /// Apply a caller-supplied deadline, checked once per batch pulled
    /// from the compiled plan (spec §5 "Cancellation & timeouts").
    pub fn with_timeout(mut self, timeout: QueryTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    fn mapping_for_table(&self, table: &str) -> EngineResult<&R2RMLMapping> {
        self.routing
            .mappings()
            .iter()
            .find(|m| m.table == table)
            .ok_or_else(|| EngineError::schema(format!("no R2RML mapping for table '{table}'")))
    }

    fn source_for(&self, table: &str) -> EngineResult<Arc<TableSource>> {
        self.sources
            .get(table)
            .cloned()
            .ok_or_else(|| EngineError::schema(format!("no TableSource registered for table '{table}'")))
    }

    /// Answer a full query: basic patterns are compiled and joined in one
    /// physical plan, each transitive pattern is resolved separately via
    /// BFS and merged in as a nested-loop join on shared variables. The
    /// query-level `limit` is applied last, after every pattern (spec §9
    /// Open Questions).
    pub fn run(&self, query: &GraphQuery) -> EngineResult<Vec<Solution>> {
        let mut solutions = if query.patterns.is_empty() {
            vec![Solution::new()]
        } else {
            self.run_basic_patterns(&query.patterns, &query.options)?
        };

        for pattern in &query.transitive_patterns {
            let pattern_solutions = self.run_transitive(pattern, &query.options)?;
            solutions = merge_solution_sets(solutions, pattern_solutions);
        }

        self.limits.result_tracker().add(solutions.len()).map_err(EngineError::from)?;

        if let Some(limit) = query.options.limit {
            solutions.truncate(limit as usize);
        }
        Ok(solutions)
    }

    fn run_basic_patterns(
        &self,
        patterns: &[TriplePattern],
        options: &QueryOptions,
    ) -> EngineResult<Vec<Solution>> {
        let mut groups: HashMap<String, PatternGroup> = HashMap::new();
        let mut var_bindings: HashMap<String, VariableBinding> = HashMap::new();

        for pattern in patterns {
            self.absorb_pattern(pattern, &mut groups, &mut var_bindings)?;
        }

        let sources: HashMap<String, Arc<TableSource>> = groups
            .keys()
            .map(|table| Ok((table.clone(), self.source_for(table)?)))
            .collect::<EngineResult<_>>()?;

        let stats_by_table = sources
            .iter()
            .map(|(table, source)| (table.clone(), source.get_statistics()))
            .collect();

        let input = CompilerInput {
            sources,
            groups: groups.into_values().collect(),
            join_graph: self.join_graph.clone(),
            stats_by_table,
            time_travel: options.time_travel.clone(),
            copy_batches: self.copy_batches,
            output_columns: None,
            limits: self.limits.clone(),
        };

        let compiled = PlanCompiler::compile(self.file_io.clone(), input)?;
        let rows = drain_plan(compiled.plan, &self.timeout)?;

        let mut solutions = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut solution = Solution::new();
            for (var, binding) in &var_bindings {
                solution.insert(var.clone(), bind_row(row, binding)?);
            }
            solutions.push(solution);
        }
        Ok(solutions)
    }

    /// Fold one pattern's subject/predicate/object into the per-table
    /// scan groups and the variable → row-shape binding map.
    fn absorb_pattern(
        &self,
        pattern: &TriplePattern,
        groups: &mut HashMap<String, PatternGroup>,
        var_bindings: &mut HashMap<String, VariableBinding>,
    ) -> EngineResult<()> {
        let candidates = self.routing.mappings_for_predicate(&pattern.predicate);
        let mapping = candidates.first().copied().ok_or_else(|| {
            EngineError::schema(format!("unknown predicate IRI '{}'", pattern.predicate))
        })?;
        let table = mapping.table.clone();
        let target = self
            .routing
            .resolve(mapping, &pattern.predicate)
            .ok_or_else(|| EngineError::schema(format!("predicate '{}' not mapped", pattern.predicate)))?;

        let group = groups.entry(table.clone()).or_insert_with(|| PatternGroup {
            table: table.clone(),
            optional: pattern.optional,
            ..Default::default()
        });
        if !pattern.optional {
            group.optional = false;
        }

        let id_columns = template_columns(&mapping.subject_template);
        match &pattern.subject {
            Term::Variable(name) => {
                add_columns(&mut group.projected_columns, &id_columns);
                var_bindings
                    .entry(name.clone())
                    .or_insert(VariableBinding::Subject {
                        subject_template: mapping.subject_template.clone(),
                        id_columns: id_columns.clone(),
                    });
            }
            Term::Iri(iri) => {
                let values = template_extract(&mapping.subject_template, iri).ok_or_else(|| {
                    EngineError::schema(format!("IRI '{iri}' doesn't match the subject template for '{table}'"))
                })?;
                let schema = self.source_for(&table)?.get_schema().clone();
                for (column, raw) in id_columns.iter().zip(values.iter()) {
                    group
                        .predicates
                        .push(Predicate::Eq { column: column.clone(), value: parse_literal(&schema, column, raw)? });
                }
            }
        }

        match target {
            PredicateTarget::Column { column, datatype, .. } => {
                let column = column.to_string();
                let datatype = datatype.map(str::to_string);
                match &pattern.object {
                    Term::Variable(name) => {
                        add_columns(&mut group.projected_columns, std::slice::from_ref(&column));
                        var_bindings.entry(name.clone()).or_insert(VariableBinding::Literal {
                            column: column.clone(),
                            datatype: datatype.clone(),
                        });
                    }
                    Term::Iri(iri) => {
                        let schema = self.source_for(&table)?.get_schema().clone();
                        let value = parse_literal(&schema, &column, iri)?;
                        group.predicates.push(Predicate::Eq { column, value });
                    }
                }
            }
            PredicateTarget::Join {
                parent_table,
                columns,
                ..
            } => {
                let parent_table = parent_table.to_string();
                let child_column = columns[0].0.to_string();
                let parent_mapping = self.mapping_for_table(&parent_table)?.clone();
                let parent_id_columns = template_columns(&parent_mapping.subject_template);

                match &pattern.object {
                    Term::Variable(name) => {
                        let parent_group = groups.entry(parent_table.clone()).or_insert_with(|| PatternGroup {
                            table: parent_table.clone(),
                            optional: pattern.optional,
                            ..Default::default()
                        });
                        if !pattern.optional {
                            parent_group.optional = false;
                        }
                        add_columns(&mut parent_group.projected_columns, &parent_id_columns);
                        var_bindings.entry(name.clone()).or_insert(VariableBinding::Subject {
                            subject_template: parent_mapping.subject_template.clone(),
                            id_columns: parent_id_columns,
                        });
                    }
                    Term::Iri(iri) => {
                        let values = template_extract(&parent_mapping.subject_template, iri).ok_or_else(|| {
                            EngineError::schema(format!(
                                "IRI '{iri}' doesn't match the subject template for '{parent_table}'"
                            ))
                        })?;
                        let schema = self.source_for(&table)?.get_schema().clone();
                        let raw = values.first().ok_or_else(|| {
                            EngineError::schema("join predicate resolved to an empty id template")
                        })?;
                        let value = parse_literal(&schema, &child_column, raw)?;
                        let group = groups.get_mut(&table).expect("group just inserted above");
                        group.predicates.push(Predicate::Eq { column: child_column, value });
                    }
                }
            }
        }
        Ok(())
    }

    fn run_transitive(&self, pattern: &TransitivePattern, options: &QueryOptions) -> EngineResult<Vec<Solution>> {
        let candidates = self.routing.mappings_for_predicate(&pattern.predicate);
        let mapping = candidates.first().copied().ok_or_else(|| {
            EngineError::schema(format!("unknown predicate IRI '{}'", pattern.predicate))
        })?;
        let target = self
            .routing
            .resolve(mapping, &pattern.predicate)
            .ok_or_else(|| EngineError::schema(format!("predicate '{}' not mapped", pattern.predicate)))?;
        let PredicateTarget::Join { child_table, columns, .. } = target else {
            return Err(EngineError::schema(format!(
                "predicate '{}' must be a self-join to support a transitive path",
                pattern.predicate
            )));
        };
        let edge_column = columns[0].0.to_string();
        let id_columns = template_columns(&mapping.subject_template);
        let id_column = id_columns
            .first()
            .cloned()
            .ok_or_else(|| EngineError::schema("transitive path subject template has no placeholder"))?;

        let table = self.source_for(child_table)?;
        let engine = TransitivePathEngine::new(
            table,
            self.file_io.clone(),
            mapping.subject_template.clone(),
            id_column,
            edge_column,
            self.depth_limit,
            options.time_travel.clone(),
        );
        let reflexive = pattern.kind == PathKind::ZeroPlus;

        match (&pattern.subject, &pattern.object) {
            (Term::Iri(start), Term::Variable(object_var)) => {
                let iris = engine.forward(start, reflexive)?;
                Ok(iris
                    .into_iter()
                    .map(|iri| single_binding(object_var, Binding::iri(iri)))
                    .collect())
            }
            (Term::Variable(subject_var), Term::Iri(start)) => {
                let iris = engine.backward(start, reflexive)?;
                Ok(iris
                    .into_iter()
                    .map(|iri| single_binding(subject_var, Binding::iri(iri)))
                    .collect())
            }
            (Term::Variable(subject_var), Term::Variable(object_var)) => {
                let pairs = engine.both_free(reflexive, options.limit)?;
                Ok(pairs
                    .into_iter()
                    .map(|(s, o)| {
                        let mut solution = Solution::new();
                        solution.insert(subject_var.clone(), Binding::iri(s));
                        solution.insert(object_var.clone(), Binding::iri(o));
                        solution
                    })
                    .collect())
            }
            (Term::Iri(start), Term::Iri(target)) => {
                let reached = engine.forward(start, reflexive)?;
                if reached.contains(target) {
                    Ok(vec![Solution::new()])
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }
}

fn single_binding(var: &str, binding: Binding) -> Solution {
    let mut solution = Solution::new();
    solution.insert(var.to_string(), binding);
    solution
}

fn add_columns(projected: &mut Vec<String>, new_columns: &[String]) {
    for column in new_columns {
        if !projected.contains(column) {
            projected.push(column.clone());
        }
    }
}

fn drain_plan(mut plan: Box<dyn Plan>, timeout: &QueryTimeout) -> EngineResult<Vec<crate::arrow_util::Row>> {
    plan.open()?;
    let mut rows = Vec::new();
    while let Some(batch) = plan.next_batch()? {
        timeout.check()?;
        rows.extend(batch_to_rows(&batch)?);
    }
    plan.close()?;
    Ok(rows)
}

fn bind_row(row: &crate::arrow_util::Row, binding: &VariableBinding) -> EngineResult<Binding> {
    match binding {
        VariableBinding::Subject {
            subject_template,
            id_columns,
        } => {
            let mut values = Vec::with_capacity(id_columns.len());
            for column in id_columns {
                match row.get(column) {
                    Some(Some(value)) => values.push(column_value_to_raw(value)),
                    _ => return Ok(Binding::Unbound),
                }
            }
            Ok(Binding::iri(template_render(subject_template, &values)))
        }
        VariableBinding::Literal { column, datatype } => match row.get(column) {
            Some(Some(value)) => Ok(Binding::literal(column_value_to_raw(value), datatype.clone())),
            _ => Ok(Binding::Unbound),
        },
    }
}

fn column_value_to_raw(value: &ColumnValue) -> String {
    match value {
        ColumnValue::Utf8(s) => s.clone(),
        ColumnValue::Int32(i) => i.to_string(),
        ColumnValue::Int64(i) => i.to_string(),
        ColumnValue::Float32(f) => f.to_string(),
        ColumnValue::Float64(f) => f.to_string(),
        ColumnValue::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

/// Parse a literal string into the typed value a column's logical type
/// expects, for building an `Eq` predicate from a bound query term.
fn parse_literal(schema: &Schema, column: &str, raw: &str) -> EngineResult<ColumnValue> {
    let field = schema
        .field(column)
        .ok_or_else(|| EngineError::schema(format!("unknown column '{column}'")))?;
    match &field.logical_type {
        LogicalType::Utf8 => Ok(ColumnValue::Utf8(raw.to_string())),
        LogicalType::Int32 => raw
            .parse()
            .map(ColumnValue::Int32)
            .map_err(|_| EngineError::schema(format!("'{raw}' is not a valid int32 for column '{column}'"))),
        LogicalType::Int64 => raw
            .parse()
            .map(ColumnValue::Int64)
            .map_err(|_| EngineError::schema(format!("'{raw}' is not a valid int64 for column '{column}'"))),
        LogicalType::Float64 => raw
            .parse()
            .map(ColumnValue::Float64)
            .map_err(|_| EngineError::schema(format!("'{raw}' is not a valid float64 for column '{column}'"))),
        other => Err(EngineError::schema(format!(
            "unsupported literal column type for '{column}': {other:?}"
        ))),
    }
}

/// Nested-loop join of two solution sets on whatever variables they have
/// in common; a variable bound in both must agree, one bound in only one
/// side simply carries over. If `left` is the single empty solution
/// (no prior patterns), this degenerates to returning `right` as-is.
fn merge_solution_sets(left: Vec<Solution>, right: Vec<Solution>) -> Vec<Solution> {
    let mut merged = Vec::new();
    for l in &left {
        for r in &right {
            if let Some(combined) = try_merge(l, r) {
                merged.push(combined);
            }
        }
    }
    merged
}

fn try_merge(left: &Solution, right: &Solution) -> Option<Solution> {
    let mut out = left.clone();
    for (var, binding) in right {
        match out.get(var) {
            Some(existing) if existing != binding => return None,
            _ => {
                out.insert(var.clone(), binding.clone());
            }
        }
    }
    Some(out)
}
