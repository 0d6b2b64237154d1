//! # Hybrid Order Book and Trade Router
//!
//! A limit order book that lives next to an automated liquidity venue (for
//! example a constant-product pool) and shares its price buckets. Taker
//! trades are routed across both: the venue leg executes first, then the
//! book leg fills at prices no worse than what the venue just delivered, so
//! the taker never does worse than the venue alone would have given it.
//!
//! ## Key Features
//!
//! - **Curve-aligned buckets**: orders are sharded by the venue's own bucket
//!   curve. An activity bitmap per side skips empty buckets.
//!
//! - **Bitmap and Fenwick price index**: each bucket side keeps an existence
//!   bitmap over discretized prices plus Fenwick trees of open quantity and
//!   order count, so best price and depth in a price range are `O(log n)`.
//!
//! - **Deferred aggregates**: placements set the existence bit and queue
//!   their level; the trees are flushed lazily, before any query reads them.
//!
//! - **Price-time priority**: orders at one price fill strictly in arrival
//!   order, prices are consumed best first, an optional limit stops the walk.
//!
//! - **Bounded work**: every match stops after a configurable number of
//!   buckets or fills and reports the remainder instead of failing.
//!
//! - **Surplus-preserving routing**: `prepare_route` estimates and splits a
//!   trade without side effects, `settle_route` executes it and settles every
//!   balance through a [`Custody`] implementation.
//!
//! - **Composite order ids**: venue, bucket, price index, sequence and side
//!   are packed into a single `u128` that stays decodable for the lifetime
//!   of the order.
//!
//! - **Snapshots and sequencing**: checksum-protected JSON snapshots restore
//!   the whole book, and a [`Sequencer`] stamps every command for replay.
//!
//! ## Example
//!
//! ```rust
//! use hybrid_orderbook::{
//!     Asset, BookConfig, ConstantProductPool, HybridBook, InMemoryCustody, LinearBucketCurve,
//! };
//! use pricelevel::{Hash32, Side};
//!
//! let curve = LinearBucketCurve::new(0, 1_024, 64).unwrap();
//! let pool = ConstantProductPool::new(1_000_000, 1_000_000_000, 30, curve).unwrap();
//! let maker = Hash32::new([1; 32]);
//! let taker = Hash32::new([2; 32]);
//!
//! let mut custody = InMemoryCustody::new();
//! custody.deposit(maker, Asset::Base, 100);
//! custody.deposit(taker, Asset::Quote, 1_000_000);
//!
//! let mut book = HybridBook::new(BookConfig::default(), pool, custody).unwrap();
//! book.place_order(maker, 995, 40, Side::Sell).unwrap();
//!
//! let outcome = book.route_trade(taker, Side::Buy, 50).unwrap();
//! assert_eq!(outcome.filled, 50);
//! assert_eq!(outcome.book.filled, 40);
//! assert!(outcome.quote_amount <= outcome.counterfactual_quote);
//! ```
//!
//! ## Side conventions
//!
//! Placement and best-price queries take the side of the resting order.
//! Matching, simulation and routing take the side of the taker: a buying
//! taker consumes asks from the lowest price up, a selling taker consumes
//! bids from the highest price down.
//!
//! ## Logging
//!
//! The crate logs through `tracing` and never installs a subscriber. Enable
//! the `metrics` feature to emit counters for routed trades, surplus and
//! scan-cap hits through the `metrics` facade.

pub mod orderbook;

pub mod prelude;
mod utils;

pub use orderbook::{
    Asset, Balance, BookConfig, Bucket, BucketCurve, BucketKey, BucketManager, CancelledOrder,
    ConstantProductPool, Custody, Fill, HybridBook, HybridBookError, InMemoryCustody,
    LinearBucketCurve, LiquidityVenue, MatchResult, Order, OrderId, OrderIdParts, OrderRequest,
    QuantizationConfig, RouteOutcome, RoutePlan, ScreenDecision, Sequencer, SequencerCommand,
    SequencerEvent, SequencerResult, StopReason, VenueFill, VenueSnapshot, VenueSnapshotPackage,
};
pub use utils::{current_time_millis, current_time_nanos};

pub use pricelevel::{Hash32, Side};

/// The default book: a constant-product pool with in-memory custody.
pub type DefaultHybridBook = HybridBook<ConstantProductPool, InMemoryCustody>;
