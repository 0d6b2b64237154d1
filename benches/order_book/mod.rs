use criterion::Criterion;
use hybrid_orderbook::{
    Asset, BookConfig, ConstantProductPool, DefaultHybridBook, HybridBook, InMemoryCustody,
    LinearBucketCurve,
};
use pricelevel::{Hash32, Side};

mod matching;
mod placement;
mod routing;

pub fn maker() -> Hash32 {
    Hash32::new([1; 32])
}

pub fn taker() -> Hash32 {
    Hash32::new([2; 32])
}

/// Book over 256 buckets of width 100 around a pool priced at 10_000.
pub fn empty_book() -> DefaultHybridBook {
    let curve = LinearBucketCurve::new(0, 100, 256).expect("valid curve");
    let pool =
        ConstantProductPool::new(10_000_000, 100_000_000_000, 30, curve).expect("valid pool");
    let mut custody = InMemoryCustody::new();
    for account in [maker(), taker()] {
        custody.deposit(account, Asset::Base, u128::from(u64::MAX));
        custody.deposit(account, Asset::Quote, u128::from(u64::MAX) * 1_000);
    }
    HybridBook::new(BookConfig::default(), pool, custody).expect("valid book")
}

/// Asks from 9_000 upward and bids from 11_000 downward, `count` orders
/// each, so takers of either side find improving liquidity.
pub fn populated_book(count: u64) -> DefaultHybridBook {
    let mut book = empty_book();
    for i in 0..count {
        let offset = u128::from(i % 1_500);
        book.place_order(maker(), 9_000 + offset, 10, Side::Sell)
            .expect("place ask");
        book.place_order(maker(), 11_000 - offset, 10, Side::Buy)
            .expect("place bid");
    }
    book
}

/// Register all order book benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    placement::register_benchmarks(c);
    matching::register_benchmarks(c);
    routing::register_benchmarks(c);
}
