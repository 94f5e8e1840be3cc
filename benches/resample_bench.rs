//! Benchmarks for the resample engine
//!
//! Run with: cargo bench

use batchscope::resample::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn create_test_records(count: usize) -> Vec<MetricRecord> {
    (0..count)
        .map(|i| {
            MetricRecord::new(format!("batch-{}", i))
                .time(format!("2024-01-{:02}T{:02}:00:00Z", i % 28 + 1, i % 24))
                .category(format!("group-{}", i % 7))
                .field("rows", (i % 1000) as f64)
                .field("parent", (i % 13) as f64)
        })
        .collect()
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    let configs = [
        ("temporal", ResampleConfig::new("time", DimensionKind::Temporal, "rows")),
        ("numeric", ResampleConfig::new("rows", DimensionKind::Numeric, "parent")),
        (
            "categorical",
            ResampleConfig::new("category", DimensionKind::Categorical, "rows")
                .aggregation(Aggregation::Avg),
        ),
    ];

    for size in [100, 1000, 5000] {
        let records = create_test_records(size);
        group.throughput(Throughput::Elements(size as u64));

        for (name, config) in &configs {
            group.bench_with_input(BenchmarkId::new(*name, size), &records, |b, records| {
                b.iter(|| compute_resample(black_box(records), black_box(config), None, None))
            });
        }
    }

    group.finish();
}

fn bench_brush(c: &mut Criterion) {
    let records = create_test_records(5000);
    let config = ResampleConfig::new("time", DimensionKind::Temporal, "rows")
        .bucket("hour")
        .range(10, 200);

    c.bench_function("brush_5000", |b| {
        b.iter(|| compute_resample(black_box(&records), black_box(&config), None, None))
    });
}

fn bench_cache_hit(c: &mut Criterion) {
    let records = create_test_records(5000);
    let config = ResampleConfig::new("time", DimensionKind::Temporal, "rows");
    let mut cache = ResampleCache::default();

    c.bench_function("cache_hit_5000", |b| {
        b.iter(|| cache.get_or_compute(black_box(&records), &config, None, None).series.len())
    });
}

criterion_group!(benches, bench_resample, bench_brush, bench_cache_hit);
criterion_main!(benches);
