/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Prelude module that re-exports commonly used types and traits.
//!
//! ```rust
//! use hybrid_orderbook::prelude::*;
//! ```

// Core book types
pub use crate::orderbook::{BookConfig, HybridBook, HybridBookError, OrderRequest};

// Venue and custody seams
pub use crate::orderbook::{
    Asset, BucketCurve, ConstantProductPool, Custody, InMemoryCustody, LinearBucketCurve,
    LiquidityVenue, VenueFill,
};

// Identifiers
pub use crate::orderbook::{BucketKey, OrderId, OrderIdParts};

// Matching and routing results
pub use crate::orderbook::{
    CancelledOrder, Fill, MatchResult, RouteOutcome, RoutePlan, ScreenDecision, StopReason,
};

// Snapshot types
pub use crate::orderbook::{VenueSnapshot, VenueSnapshotPackage};

// Sequencer
pub use crate::orderbook::{Sequencer, SequencerCommand, SequencerEvent, SequencerResult};

pub use pricelevel::{Hash32, Side};

// Utility functions
pub use crate::utils::current_time_millis;

pub use crate::DefaultHybridBook;
