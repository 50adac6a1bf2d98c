//! Criterion benchmarks for the dispatch pipeline.
//!
//! Benchmarks:
//! 1. Partitioning a large universe
//! 2. Full select, serial vs parallel, over an in-memory universe

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use screenlab_core::data::{InMemoryProvider, SyntheticProvider};
use screenlab_core::domain::Symbol;
use screenlab_core::env::{CacheBackend, DataFetchMode, EnvSettings, SharedEnv};
use screenlab_core::factors::FactorRequest;
use screenlab_runner::{partition, JsonSplitStore, Screener, SelectRequest};

// ── Helpers ──────────────────────────────────────────────────────────

fn universe(n: usize) -> Vec<Symbol> {
    (0..n).map(|i| format!("SYM{i:04}")).collect()
}

fn provider(symbols: &[Symbol]) -> InMemoryProvider {
    let synthetic = SyntheticProvider::default();
    let mut provider = InMemoryProvider::new();
    for s in symbols {
        provider.insert(s.clone(), synthetic.generate(s));
    }
    provider
}

fn chain() -> Vec<FactorRequest> {
    vec![
        FactorRequest::new("price_min_max").with_param("threshold_price_min", 1.0),
        FactorRequest::new("regress_ang")
            .with_param("threshold_ang_min", -10.0)
            .with_param("xd", 120.0),
        FactorRequest::new("mean_regime").with_param("mean_xd", 60.0),
    ]
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_partition(c: &mut Criterion) {
    let symbols = universe(5000);
    c.bench_function("partition_5000_over_32", |b| {
        b.iter(|| partition(black_box(&symbols), black_box(32)))
    });
}

fn bench_select(c: &mut Criterion) {
    let symbols = universe(400);
    let provider = provider(&symbols);
    let env = SharedEnv::new(EnvSettings {
        fetch_mode: DataFetchMode::ForceLocal,
        cache_backend: CacheBackend::Csv,
        ..EnvSettings::default()
    });
    let split_dir = std::env::temp_dir().join("screenlab-bench-split");
    let splits = JsonSplitStore::new(split_dir);
    let screener = Screener::new(&env, &provider, &provider, &splits);

    let mut group = c.benchmark_group("select_400");
    group.sample_size(20);
    for workers in [1usize, 2, 4, 8] {
        let request = SelectRequest {
            factors: chain(),
            workers,
            ..SelectRequest::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(workers), &request, |b, req| {
            b.iter(|| screener.select(black_box(req)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_partition, bench_select);
criterion_main!(benches);
