//! Benchmarks for stage progress computation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use radflow::core::StageId;
use radflow::registry::{ModelCatalog, StageRegistry};
use radflow::stages::{progress_at, StageTicker};
use std::time::Duration;
use tokio::time::Instant;

fn ticker_benchmark(c: &mut Criterion) {
    let duration = Duration::from_millis(2000);

    c.bench_function("progress_at", |b| {
        b.iter(|| progress_at(black_box(Duration::from_millis(1234)), black_box(duration)));
    });

    let start = Instant::now();
    let ticker = StageTicker::new(StageId::new(2), start, duration);
    c.bench_function("ticker_full_stage", |b| {
        b.iter(|| {
            for ms in (0..=2000).step_by(16) {
                black_box(ticker.tick(start + Duration::from_millis(ms)));
            }
        });
    });
}

fn registry_benchmark(c: &mut Criterion) {
    let registry = StageRegistry::default();
    let catalog = ModelCatalog::default();

    c.bench_function("required_stages_all_models", |b| {
        b.iter(|| {
            catalog
                .models()
                .iter()
                .flat_map(|m| registry.stages().iter().map(move |s| (s.id, m)))
                .filter(|(id, m)| registry.is_required(*id, m))
                .count()
        });
    });
}

criterion_group!(benches, ticker_benchmark, registry_benchmark);
criterion_main!(benches);
