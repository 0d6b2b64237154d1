use super::populated_book;
use criterion::{BenchmarkId, Criterion};
use pricelevel::Side;
use std::hint::black_box;

/// Register cross-bucket matching benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("HybridBook - Matching");

    for &quantity in &[10u64, 1_000, 5_000] {
        group.bench_with_input(
            BenchmarkId::new("match_across_buckets", quantity),
            &quantity,
            |b, &quantity| {
                b.iter_with_setup(
                    || populated_book(2_000).manager().clone(),
                    |mut manager| {
                        black_box(manager.match_across_buckets(Side::Buy, quantity, None, None))
                    },
                );
            },
        );
    }

    for &quantity in &[10u64, 1_000, 5_000] {
        group.bench_with_input(
            BenchmarkId::new("simulate", quantity),
            &quantity,
            |b, &quantity| {
                let book = populated_book(2_000);
                let mut manager = book.manager().clone();
                b.iter(|| black_box(manager.simulate(Side::Sell, quantity, Some(10_001))));
            },
        );
    }

    group.finish();
}
