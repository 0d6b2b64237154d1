use super::{empty_book, populated_book, taker};
use criterion::{BenchmarkId, Criterion};
use pricelevel::Side;
use std::hint::black_box;

/// Register routing benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("HybridBook - Routing");

    for &quantity in &[10u64, 500, 5_000] {
        group.bench_with_input(
            BenchmarkId::new("prepare_route", quantity),
            &quantity,
            |b, &quantity| {
                let mut book = populated_book(2_000);
                b.iter(|| black_box(book.prepare_route(Side::Buy, quantity).ok()));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("route_trade", quantity),
            &quantity,
            |b, &quantity| {
                b.iter_with_setup(
                    || populated_book(2_000),
                    |mut book| black_box(book.route_trade(taker(), Side::Sell, quantity).ok()),
                );
            },
        );
    }

    group.bench_function("route_trade_venue_only", |b| {
        b.iter_with_setup(empty_book, |mut book| {
            black_box(book.route_trade(taker(), Side::Buy, 100).ok())
        });
    });

    group.finish();
}
