use super::{empty_book, maker, populated_book};
use criterion::{BenchmarkId, Criterion};
use hybrid_orderbook::OrderRequest;
use pricelevel::Side;
use std::hint::black_box;

/// Register placement and cancellation benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("HybridBook - Placement");

    for &order_count in &[100u64, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("place_order", order_count),
            &order_count,
            |b, &count| {
                b.iter_with_setup(empty_book, |mut book| {
                    for i in 0..count {
                        let price = 5_000 + u128::from(i % 10_000);
                        black_box(book.place_order(maker(), price, 10, Side::Sell).ok());
                    }
                });
            },
        );
    }

    group.bench_function("place_orders_batch_64", |b| {
        let requests: Vec<OrderRequest> = (0..64u128)
            .map(|i| OrderRequest::new(9_000 + i * 7, 5, Side::Sell))
            .collect();
        b.iter_with_setup(empty_book, |mut book| {
            black_box(book.place_orders_batch(maker(), &requests).ok());
        });
    });

    group.bench_function("cancel_order", |b| {
        b.iter_with_setup(
            || {
                let mut book = populated_book(1_000);
                let order_id = book
                    .place_order(maker(), 9_555, 10, Side::Sell)
                    .expect("place ask");
                (book, order_id)
            },
            |(mut book, order_id)| {
                black_box(book.cancel_order(maker(), order_id).ok());
            },
        );
    });

    group.bench_function("best_ask_after_placement", |b| {
        b.iter_with_setup(
            || populated_book(1_000),
            |mut book| {
                black_box(book.best_ask());
            },
        );
    });

    group.finish();
}
