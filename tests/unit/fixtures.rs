#![allow(dead_code)]

use hybrid_orderbook::{
    Asset, BookConfig, ConstantProductPool, DefaultHybridBook, HybridBook, InMemoryCustody,
    LinearBucketCurve,
};
use pricelevel::Hash32;

pub fn maker() -> Hash32 {
    Hash32::new([1; 32])
}

pub fn taker() -> Hash32 {
    Hash32::new([2; 32])
}

/// 64 buckets of width 100 from zero.
pub fn curve() -> LinearBucketCurve {
    LinearBucketCurve::new(0, 100, 64).expect("valid curve")
}

/// Pool quoting one base at 1_000 quote with a 30 bps fee.
pub fn pool() -> ConstantProductPool {
    ConstantProductPool::new(1_000_000, 1_000_000_000, 30, curve()).expect("valid pool")
}

/// Maker and taker funded with 100_000 base and 10_000_000 quote each.
pub fn funded_custody() -> InMemoryCustody {
    let mut custody = InMemoryCustody::new();
    for account in [maker(), taker()] {
        custody.deposit(account, Asset::Base, 100_000);
        custody.deposit(account, Asset::Quote, 10_000_000);
    }
    custody
}

pub fn book_with(config: BookConfig) -> DefaultHybridBook {
    HybridBook::new(config, pool(), funded_custody()).expect("valid book")
}

pub fn book() -> DefaultHybridBook {
    book_with(BookConfig::default())
}
