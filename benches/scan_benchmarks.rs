//! Stand-ins for scan-path costs that don't require a live Iceberg table:
//! predicate evaluation over Arrow batches (the per-row-group filter step
//! `Scan` applies after Parquet decode) and HyperLogLog sketch throughput
//! (the per-column NDV estimation `TableSource` feeds into cost pushdown).

use std::sync::Arc;

use arrow::array::{Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use icegraph::arrow_util::{filter_arrow_batch, Batch, ColumnValue, Predicate};
use icegraph::statistics::HyperLogLog;

fn sample_batch(n: i32) -> Batch {
    let ids: Vec<i32> = (0..n).collect();
    let countries: Vec<String> = (0..n)
        .map(|i| ["US", "CA", "MX", "DE", "FR"][(i % 5) as usize].to_string())
        .collect();
    let rb = RecordBatch::try_new(
        Arc::new(ArrowSchema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("country", DataType::Utf8, true),
        ])),
        vec![
            Arc::new(Int32Array::from(ids)),
            Arc::new(StringArray::from(countries)),
        ],
    )
    .unwrap();
    Batch::from_record_batch(rb)
}

fn bench_predicate_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicate_filter");
    for size in [1_000i32, 100_000] {
        let batch = sample_batch(size);
        let predicate = Predicate::Eq {
            column: "country".to_string(),
            value: ColumnValue::Utf8("US".to_string()),
        }
        .prepare();
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| filter_arrow_batch(batch, std::slice::from_ref(&predicate), false).unwrap());
        });
    }
    group.finish();
}

fn bench_predicate_filter_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicate_filter_copy");
    for size in [1_000i32, 100_000] {
        let batch = sample_batch(size);
        let predicate = Predicate::Eq {
            column: "country".to_string(),
            value: ColumnValue::Utf8("US".to_string()),
        }
        .prepare();
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| filter_arrow_batch(batch, std::slice::from_ref(&predicate), true).unwrap());
        });
    }
    group.finish();
}

fn bench_hll_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hll_insert");
    for size in [10_000usize, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut sketch = HyperLogLog::new();
                for i in 0..size {
                    sketch.insert(&i);
                }
                sketch.estimate()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_predicate_filter,
    bench_predicate_filter_copy,
    bench_hll_insert
);
criterion_main!(benches);
