//! Exercises the physical operator tree (`Scan` stands in for a hand-built
//! in-memory source so these don't need a real Iceberg table) end to end:
//! inner/left-outer `HashJoin`, `Project`, and query-level row limits.

use std::sync::Arc;

use arrow::array::{Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;

use icegraph::arrow_util::{batch_to_rows, Batch, ColumnValue};
use icegraph::error::EngineResult;
use icegraph::execution::ResourceLimits;
use icegraph::iceberg_source::{FieldSchema, LogicalType, Schema};
use icegraph::physical::{HashJoin, Plan, Project};

/// A fixed set of pre-built batches, replayed once per `open`/`close`
/// cycle. Stands in for `physical::Scan` in tests that don't need real
/// Iceberg metadata.
struct MemoryPlan {
    schema: Schema,
    batches: Vec<Batch>,
    cursor: usize,
}

impl MemoryPlan {
    fn new(schema: Schema, batches: Vec<RecordBatch>) -> Self {
        MemoryPlan {
            schema,
            batches: batches.into_iter().map(Batch::from_record_batch).collect(),
            cursor: 0,
        }
    }
}

impl Plan for MemoryPlan {
    fn open(&mut self) -> EngineResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn next_batch(&mut self) -> EngineResult<Option<Batch>> {
        if self.cursor >= self.batches.len() {
            return Ok(None);
        }
        let batch = self.batches[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(batch))
    }

    fn close(&mut self) -> EngineResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn estimated_rows(&self) -> u64 {
        self.batches.iter().map(|b| b.num_rows() as u64).sum()
    }

    fn schema(&self) -> Schema {
        self.schema.clone()
    }
}

fn int_field(name: &str) -> FieldSchema {
    FieldSchema {
        name: name.to_string(),
        logical_type: LogicalType::Int32,
        nullable: true,
        is_partition_key: false,
    }
}

fn string_field(name: &str) -> FieldSchema {
    FieldSchema {
        name: name.to_string(),
        logical_type: LogicalType::Utf8,
        nullable: true,
        is_partition_key: false,
    }
}

fn airlines_plan() -> MemoryPlan {
    let schema = Schema {
        fields: vec![int_field("id"), string_field("country")],
        partition_spec: Vec::new(),
    };
    let rb = RecordBatch::try_new(
        Arc::new(ArrowSchema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("country", DataType::Utf8, true),
        ])),
        vec![
            Arc::new(Int32Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec!["US", "CA", "MX"])),
        ],
    )
    .unwrap();
    MemoryPlan::new(schema, vec![rb])
}

fn routes_plan() -> MemoryPlan {
    let schema = Schema {
        fields: vec![int_field("id"), int_field("airline_id"), string_field("dst")],
        partition_spec: Vec::new(),
    };
    let rb = RecordBatch::try_new(
        Arc::new(ArrowSchema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("airline_id", DataType::Int32, true),
            Field::new("dst", DataType::Utf8, true),
        ])),
        vec![
            Arc::new(Int32Array::from(vec![100, 101, 102])),
            // route 102 references an airline (id=9) absent from airlines_plan.
            Arc::new(Int32Array::from(vec![1, 2, 9])),
            Arc::new(StringArray::from(vec!["LAX", "YYZ", "MEX"])),
        ],
    )
    .unwrap();
    MemoryPlan::new(schema, vec![rb])
}

#[test]
fn inner_hash_join_drops_unmatched_build_side_misses() {
    let probe = Box::new(routes_plan());
    let build = Box::new(airlines_plan());
    let mut join = HashJoin::new(
        probe,
        build,
        vec!["airline_id".to_string()],
        vec!["id".to_string()],
        false,
        None,
        ResourceLimits::unlimited(),
    );

    join.open().unwrap();
    let mut rows = Vec::new();
    while let Some(batch) = join.next_batch().unwrap() {
        rows.extend(batch_to_rows(&batch).unwrap());
    }
    join.close().unwrap();

    // route 102 (airline_id=9) has no matching airline: inner join drops it.
    assert_eq!(rows.len(), 2);
    let dsts: Vec<_> = rows
        .iter()
        .filter_map(|r| match r.get("dst") {
            Some(Some(ColumnValue::Utf8(s))) => Some(s.clone()),
            _ => None,
        })
        .collect();
    assert!(dsts.contains(&"LAX".to_string()));
    assert!(dsts.contains(&"YYZ".to_string()));
    assert!(!dsts.contains(&"MEX".to_string()));
}

#[test]
fn left_outer_hash_join_keeps_unmatched_probe_rows() {
    let probe = Box::new(routes_plan());
    let build = Box::new(airlines_plan());
    let mut join = HashJoin::new(
        probe,
        build,
        vec!["airline_id".to_string()],
        vec!["id".to_string()],
        true,
        None,
        ResourceLimits::unlimited(),
    );

    join.open().unwrap();
    let mut rows = Vec::new();
    while let Some(batch) = join.next_batch().unwrap() {
        rows.extend(batch_to_rows(&batch).unwrap());
    }
    join.close().unwrap();

    assert_eq!(rows.len(), 3);
    let mex_row = rows
        .iter()
        .find(|r| matches!(r.get("dst"), Some(Some(ColumnValue::Utf8(s))) if s == "MEX"))
        .expect("MEX route present");
    // the build-side "country" column is null for the unmatched airline.
    assert_eq!(mex_row.get("country"), Some(&None));
}

#[test]
fn project_drops_columns_not_in_the_requested_set() {
    let mut projected = Project::new(Box::new(airlines_plan()), vec!["country".to_string()]);
    projected.open().unwrap();
    let batch = projected.next_batch().unwrap().expect("one batch");
    projected.close().unwrap();

    assert_eq!(batch.num_columns(), 1);
    assert_eq!(batch.schema().field(0).name(), "country");
}

#[test]
fn hash_join_build_side_cap_surfaces_as_a_resource_error() {
    let probe = Box::new(routes_plan());
    let build = Box::new(airlines_plan());
    let mut join = HashJoin::new(
        probe,
        build,
        vec!["airline_id".to_string()],
        vec!["id".to_string()],
        false,
        None,
        ResourceLimits::unlimited().with_max_build_side_rows(1),
    );

    let err = join.open().unwrap_err();
    assert!(err.to_string().contains("build side"));
}
