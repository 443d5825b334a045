//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stagepipe::prelude::*;

fn flat(stages: usize) -> Pipeline<u64> {
    (0..stages).fold(Pipeline::<u64>::new(), |pipeline, i| {
        pipeline.pipe_map(format!("add_{i}"), |n| Ok(n.wrapping_add(1)))
    })
}

/// Same stages as [`flat`], split into nested pipelines of four.
fn nested(stages: usize) -> Pipeline<u64> {
    let mut outer = Pipeline::<u64>::named("outer");
    let mut remaining = stages;
    while remaining > 0 {
        let chunk = remaining.min(4);
        outer = outer.pipe(flat(chunk));
        remaining -= chunk;
    }
    outer
}

fn pipeline_benchmark(c: &mut Criterion) {
    let empty = Pipeline::<u64>::new();
    c.bench_function("empty", |b| b.iter(|| empty.process(black_box(42))));

    let mut group = c.benchmark_group("process");
    for stages in [1, 8, 32] {
        let flat = flat(stages);
        let nested = nested(stages);
        group.bench_with_input(BenchmarkId::new("flat", stages), &flat, |b, p| {
            b.iter(|| p.process(black_box(0)));
        });
        group.bench_with_input(BenchmarkId::new("nested", stages), &nested, |b, p| {
            b.iter(|| p.process(black_box(0)));
        });
    }
    group.finish();

    let sink = std::sync::Arc::new(CollectingEventSink::new());
    let observed = flat(8).with_event_sink(sink.clone());
    c.bench_function("process_with_events", |b| {
        b.iter(|| {
            sink.clear();
            observed.process(black_box(0))
        });
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
