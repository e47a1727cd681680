//! Hash-join throughput across build-side sizes, plus the bloom filter
//! and join-order cost helpers that feed the compiler's plan choice.

use std::sync::Arc;

use arrow::array::{Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use icegraph::bloom_filter::BloomFilter;
use icegraph::execution::ResourceLimits;
use icegraph::iceberg_source::{FieldSchema, LogicalType, Schema};
use icegraph::physical::{HashJoin, Plan};

struct MemoryPlan {
    schema: Schema,
    batches: Vec<RecordBatch>,
    cursor: usize,
}

impl MemoryPlan {
    fn new(schema: Schema, batches: Vec<RecordBatch>) -> Self {
        MemoryPlan {
            schema,
            batches,
            cursor: 0,
        }
    }
}

impl Plan for MemoryPlan {
    fn open(&mut self) -> icegraph::error::EngineResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn next_batch(&mut self) -> icegraph::error::EngineResult<Option<icegraph::arrow_util::Batch>> {
        if self.cursor >= self.batches.len() {
            return Ok(None);
        }
        let batch = icegraph::arrow_util::Batch::from_record_batch(self.batches[self.cursor].clone());
        self.cursor += 1;
        Ok(Some(batch))
    }

    fn close(&mut self) -> icegraph::error::EngineResult<()> {
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

fn field(name: &str, ty: LogicalType) -> FieldSchema {
    FieldSchema {
        name: name.to_string(),
        logical_type: ty,
        nullable: true,
        is_partition_key: false,
    }
}

fn build_side(n: i32) -> MemoryPlan {
    let schema = Schema {
        fields: vec![field("id", LogicalType::Int32), field("label", LogicalType::Utf8)],
        partition_spec: Vec::new(),
    };
    let ids: Vec<i32> = (0..n).collect();
    let labels: Vec<String> = (0..n).map(|i| format!("label-{i}")).collect();
    let rb = RecordBatch::try_new(
        Arc::new(ArrowSchema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("label", DataType::Utf8, true),
        ])),
        vec![
            Arc::new(Int32Array::from(ids)),
            Arc::new(StringArray::from(labels)),
        ],
    )
    .unwrap();
    MemoryPlan::new(schema, vec![rb])
}

fn probe_side(n: i32, fan_out: i32) -> MemoryPlan {
    let schema = Schema {
        fields: vec![field("row", LogicalType::Int32), field("ref_id", LogicalType::Int32)],
        partition_spec: Vec::new(),
    };
    let rows: Vec<i32> = (0..n * fan_out).collect();
    let refs: Vec<i32> = (0..n * fan_out).map(|i| i % n).collect();
    let rb = RecordBatch::try_new(
        Arc::new(ArrowSchema::new(vec![
            Field::new("row", DataType::Int32, true),
            Field::new("ref_id", DataType::Int32, true),
        ])),
        vec![Arc::new(Int32Array::from(rows)), Arc::new(Int32Array::from(refs))],
    )
    .unwrap();
    MemoryPlan::new(schema, vec![rb])
}

fn bench_hash_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_join");
    for size in [1_000i32, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut join = HashJoin::new(
                    Box::new(probe_side(size, 4)),
                    Box::new(build_side(size)),
                    vec!["ref_id".to_string()],
                    vec!["id".to_string()],
                    false,
                    None,
                    ResourceLimits::unlimited(),
                );
                join.open().unwrap();
                let mut total = 0usize;
                while let Some(batch) = join.next_batch().unwrap() {
                    total += batch.num_rows();
                }
                join.close().unwrap();
                total
            });
        });
    }
    group.finish();
}

fn bench_bloom_filter_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("bloom_filter_insert");
    for size in [1_000usize, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut filter = BloomFilter::new(size, 0.01);
                for i in 0..size {
                    filter.insert(&i);
                }
                filter
            });
        });
    }
    group.finish();
}

fn bench_bloom_filter_probe(c: &mut Criterion) {
    let mut group = c.benchmark_group("bloom_filter_probe");
    for size in [1_000usize, 100_000] {
        let mut filter = BloomFilter::new(size, 0.01);
        for i in 0..size {
            filter.insert(&i);
        }
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut hits = 0usize;
                for i in 0..size {
                    if filter.might_contain(&i) {
                        hits += 1;
                    }
                }
                hits
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_hash_join,
    bench_bloom_filter_insert,
    bench_bloom_filter_probe
);
criterion_main!(benches);
