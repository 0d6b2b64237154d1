//! Hybrid order book: a limit order book sharded along a liquidity venue's
//! bucket curve, and the router that splits taker trades between the two.

/// Constant-product pool implementing the venue traits.
pub mod amm;
pub mod bitmap;
pub mod book;
pub mod bucket;
pub mod config;
/// Balance locking and settlement.
pub mod custody;
pub mod error;
pub mod level;
pub mod manager;
pub mod matching;
pub mod order;
pub mod price_index;
pub mod quantization;
/// Two-phase trade routing and settlement.
pub mod routing;
/// Total-ordered command execution.
pub mod sequencer;
pub mod snapshot;
/// Traits consumed from the alternative venue.
pub mod venue;

pub use amm::ConstantProductPool;
pub use book::{HybridBook, OrderRequest};
pub use bucket::Bucket;
pub use config::BookConfig;
pub use custody::{Asset, Balance, Custody, InMemoryCustody};
pub use error::HybridBookError;
pub use manager::{BucketManager, CancelledOrder, PlacementPlan, ScreenEstimate, Simulation};
pub use matching::{Fill, MatchResult, StopReason};
pub use order::{BucketKey, Order, OrderId, OrderIdParts};
pub use price_index::PriceIndex;
pub use quantization::{DEFAULT_PRICE_POINTS, MAX_PRICE_POINTS, QuantizationConfig};
pub use routing::{RouteOutcome, RoutePlan, ScreenDecision};
pub use sequencer::{Sequencer, SequencerCommand, SequencerEvent, SequencerResult};
pub use snapshot::{
    BucketSnapshot, LevelSnapshot, OrderSnapshot, SNAPSHOT_FORMAT_VERSION, VenueSnapshot,
    VenueSnapshotPackage,
};
pub use venue::{BucketCurve, LinearBucketCurve, LiquidityVenue, VenueFill};
