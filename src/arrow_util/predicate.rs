//! Columnar predicate evaluation (spec §4.3).
//!
//! Predicates are normalized once (`In.values` → hash-set, `Between.value`
//! → a 2-tuple) and then evaluated directly against typed Arrow columns,
//! column-by-column, short-circuiting the conjunction of an `And` as soon
//! as a child clears no rows. Unknown operators pass through as `true`
//! (spec §9 Open Questions) with a warning logged.

use arrow::array::{Array, BooleanArray};
use arrow::record_batch::RecordBatch;
use std::collections::HashSet;

use super::value::ColumnValue;
use crate::storage::StorageError;

/// A predicate over a single column, or a boolean combination of
/// predicates (spec §3.1).
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq { column: String, value: ColumnValue },
    Ne { column: String, value: ColumnValue },
    Gt { column: String, value: ColumnValue },
    Gte { column: String, value: ColumnValue },
    Lt { column: String, value: ColumnValue },
    Lte { column: String, value: ColumnValue },
    In { column: String, values: Vec<ColumnValue> },
    Between { column: String, lo: ColumnValue, hi: ColumnValue },
    IsNull { column: String },
    NotNull { column: String },
    And { children: Vec<Predicate> },
    Or { children: Vec<Predicate> },
}

/// A predicate after one-time normalization: `In.values` becomes a hash
/// set for O(1) membership tests, `Between` a pre-extracted pair. This is
/// the form actually walked during evaluation.
#[derive(Debug, Clone)]
pub enum PreparedPredicate {
    Eq { column: String, value: ColumnValue },
    Ne { column: String, value: ColumnValue },
    Gt { column: String, value: ColumnValue },
    Gte { column: String, value: ColumnValue },
    Lt { column: String, value: ColumnValue },
    Lte { column: String, value: ColumnValue },
    In { column: String, values: HashSet<ColumnValue> },
    Between { column: String, lo: ColumnValue, hi: ColumnValue },
    IsNull { column: String },
    NotNull { column: String },
    And { children: Vec<PreparedPredicate> },
    Or { children: Vec<PreparedPredicate> },
    /// An operator this build doesn't recognize. Evaluates to `true` for
    /// every row (pass-through), per spec §9.
    Unknown { description: String },
}

impl Predicate {
    pub fn prepare(&self) -> PreparedPredicate {
        match self {
            Predicate::Eq { column, value } => PreparedPredicate::Eq {
                column: column.clone(),
                value: value.clone(),
            },
            Predicate::Ne { column, value } => PreparedPredicate::Ne {
                column: column.clone(),
                value: value.clone(),
            },
            Predicate::Gt { column, value } => PreparedPredicate::Gt {
                column: column.clone(),
                value: value.clone(),
            },
            Predicate::Gte { column, value } => PreparedPredicate::Gte {
                column: column.clone(),
                value: value.clone(),
            },
            Predicate::Lt { column, value } => PreparedPredicate::Lt {
                column: column.clone(),
                value: value.clone(),
            },
            Predicate::Lte { column, value } => PreparedPredicate::Lte {
                column: column.clone(),
                value: value.clone(),
            },
            Predicate::In { column, values } => PreparedPredicate::In {
                column: column.clone(),
                values: values.iter().cloned().collect(),
            },
            Predicate::Between { column, lo, hi } => PreparedPredicate::Between {
                column: column.clone(),
                lo: lo.clone(),
                hi: hi.clone(),
            },
            Predicate::IsNull { column } => PreparedPredicate::IsNull {
                column: column.clone(),
            },
            Predicate::NotNull { column } => PreparedPredicate::NotNull {
                column: column.clone(),
            },
            Predicate::And { children } => PreparedPredicate::And {
                children: children.iter().map(Predicate::prepare).collect(),
            },
            Predicate::Or { children } => PreparedPredicate::Or {
                children: children.iter().map(Predicate::prepare).collect(),
            },
        }
    }
}

/// Collect the distinct column names a predicate touches, for projection
/// pushdown (spec §4.6.5 step 1).
pub fn referenced_columns(predicate: &Predicate, out: &mut HashSet<String>) {
    match predicate {
        Predicate::Eq { column, .. }
        | Predicate::Ne { column, .. }
        | Predicate::Gt { column, .. }
        | Predicate::Gte { column, .. }
        | Predicate::Lt { column, .. }
        | Predicate::Lte { column, .. }
        | Predicate::In { column, .. }
        | Predicate::Between { column, .. }
        | Predicate::IsNull { column }
        | Predicate::NotNull { column } => {
            out.insert(column.clone());
        }
        Predicate::And { children } | Predicate::Or { children } => {
            for child in children {
                referenced_columns(child, out);
            }
        }
    }
}

/// Evaluate a prepared predicate against a batch, producing a row mask.
/// Row `i` is `true` iff the row matches. Rows failing a null-dependent
/// comparison evaluate to `false`, never `true`.
pub fn eval_predicate(
    batch: &RecordBatch,
    predicate: &PreparedPredicate,
) -> Result<BooleanArray, StorageError> {
    match predicate {
        PreparedPredicate::And { children } => {
            let mut mask: Option<BooleanArray> = None;
            for child in children {
                let child_mask = eval_predicate(batch, child)?;
                mask = Some(match mask {
                    None => child_mask,
                    Some(acc) => and_masks(&acc, &child_mask),
                });
                // Short-circuit: once the running mask is all-false there is
                // nothing left any further conjunct could select.
                if let Some(acc) = &mask {
                    if acc.true_count() == 0 {
                        break;
                    }
                }
            }
            Ok(mask.unwrap_or_else(|| all_true(batch.num_rows())))
        }
        PreparedPredicate::Or { children } => {
            let mut mask: Option<BooleanArray> = None;
            for child in children {
                let child_mask = eval_predicate(batch, child)?;
                mask = Some(match mask {
                    None => child_mask,
                    Some(acc) => or_masks(&acc, &child_mask),
                });
            }
            Ok(mask.unwrap_or_else(|| all_true(batch.num_rows())))
        }
        PreparedPredicate::Unknown { description } => {
            tracing::warn!(operator = %description, "unknown predicate operator, passing through");
            Ok(all_true(batch.num_rows()))
        }
        PreparedPredicate::IsNull { column } => {
            let array = column_array(batch, column)?;
            Ok(arrow::compute::is_null(array)?)
        }
        PreparedPredicate::NotNull { column } => {
            let array = column_array(batch, column)?;
            Ok(arrow::compute::is_not_null(array)?)
        }
        PreparedPredicate::Eq { column, value } => cmp(batch, column, value, Cmp::Eq),
        PreparedPredicate::Ne { column, value } => cmp(batch, column, value, Cmp::Ne),
        PreparedPredicate::Gt { column, value } => cmp(batch, column, value, Cmp::Gt),
        PreparedPredicate::Gte { column, value } => cmp(batch, column, value, Cmp::Gte),
        PreparedPredicate::Lt { column, value } => cmp(batch, column, value, Cmp::Lt),
        PreparedPredicate::Lte { column, value } => cmp(batch, column, value, Cmp::Lte),
        PreparedPredicate::Between { column, lo, hi } => {
            let ge = cmp(batch, column, lo, Cmp::Gte)?;
            let le = cmp(batch, column, hi, Cmp::Lte)?;
            Ok(and_masks(&ge, &le))
        }
        PreparedPredicate::In { column, values } => {
            let array = column_array(batch, column)?;
            let mut out = Vec::with_capacity(array.len());
            for row in 0..array.len() {
                if array.is_null(row) {
                    out.push(Some(false));
                    continue;
                }
                let v = ColumnValue::from_array(array, row)?;
                out.push(Some(values.contains(&v)));
            }
            Ok(BooleanArray::from(out))
        }
    }
}

#[derive(Clone, Copy)]
enum Cmp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

fn cmp(
    batch: &RecordBatch,
    column: &str,
    value: &ColumnValue,
    op: Cmp,
) -> Result<BooleanArray, StorageError> {
    let array = column_array(batch, column)?;
    let mut out = Vec::with_capacity(array.len());
    for row in 0..array.len() {
        if array.is_null(row) {
            out.push(Some(false));
            continue;
        }
        let lhs = ColumnValue::from_array(array, row)?;
        let matched = match op {
            Cmp::Eq => lhs == *value,
            Cmp::Ne => lhs != *value,
            Cmp::Gt => lhs.partial_cmp_value(value) == Some(std::cmp::Ordering::Greater),
            Cmp::Gte => matches!(
                lhs.partial_cmp_value(value),
                Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
            ),
            Cmp::Lt => lhs.partial_cmp_value(value) == Some(std::cmp::Ordering::Less),
            Cmp::Lte => matches!(
                lhs.partial_cmp_value(value),
                Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
            ),
        };
        out.push(Some(matched));
    }
    Ok(BooleanArray::from(out))
}

fn column_array<'a>(
    batch: &'a RecordBatch,
    column: &str,
) -> Result<&'a arrow::array::ArrayRef, StorageError> {
    let idx = batch.schema().index_of(column).map_err(|_| {
        StorageError::Arrow(arrow::error::ArrowError::SchemaError(format!(
            "unknown column: {column}"
        )))
    })?;
    Ok(batch.column(idx))
}

fn all_true(len: usize) -> BooleanArray {
    BooleanArray::from(vec![true; len])
}

fn and_masks(a: &BooleanArray, b: &BooleanArray) -> BooleanArray {
    arrow::compute::and(a, b).expect("boolean masks share row count")
}

fn or_masks(a: &BooleanArray, b: &BooleanArray) -> BooleanArray {
    arrow::compute::or(a, b).expect("boolean masks share row count")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow_util::test_support::{country_batch, sample_batch};

    #[test]
    fn eq_predicate_selects_matching_rows() {
        let batch = country_batch();
        let predicate = Predicate::Eq {
            column: "country".to_string(),
            value: ColumnValue::Utf8("United States".to_string()),
        }
        .prepare();
        let mask = eval_predicate(&batch, &predicate).unwrap();
        assert_eq!(mask.true_count(), 2);
    }

    #[test]
    fn and_short_circuits_to_zero_matches() {
        let batch = sample_batch();
        let predicate = Predicate::And {
            children: vec![
                Predicate::Eq {
                    column: "id".to_string(),
                    value: ColumnValue::Int32(1),
                },
                Predicate::Eq {
                    column: "id".to_string(),
                    value: ColumnValue::Int32(2),
                },
            ],
        }
        .prepare();
        let mask = eval_predicate(&batch, &predicate).unwrap();
        assert_eq!(mask.true_count(), 0);
    }

    #[test]
    fn unknown_operator_passes_through() {
        let batch = sample_batch();
        let predicate = PreparedPredicate::Unknown {
            description: "fictional_op".to_string(),
        };
        let mask = eval_predicate(&batch, &predicate).unwrap();
        assert_eq!(mask.true_count(), batch.num_rows());
    }
}
