//! Core types for the sequencer.
//!
//! Commands, results and events are serde-serializable so a log of events
//! can be persisted and replayed against a fresh book.

use pricelevel::{Hash32, Side};
use serde::{Deserialize, Serialize};

use crate::orderbook::order::OrderId;

/// A command submitted to the sequencer for total-ordered execution.
///
/// Each variant maps to a single [`HybridBook`](crate::HybridBook)
/// operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SequencerCommand {
    /// Rest a limit order on the book.
    PlaceOrder {
        /// Account placing the order
        maker: Hash32,
        /// Limit price
        price: u128,
        /// Base quantity
        quantity: u64,
        /// Side of the resting order
        side: Side,
    },

    /// Cancel an order on behalf of its maker.
    CancelOrder {
        /// Account requesting the cancellation
        caller: Hash32,
        /// Order to cancel
        order_id: OrderId,
    },

    /// Route a taker trade across the book and the venue.
    RouteTrade {
        /// Account taking liquidity
        initiator: Hash32,
        /// Direction of the taker
        side: Side,
        /// Base quantity
        quantity: u64,
    },
}

/// The outcome of executing a [`SequencerCommand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SequencerResult {
    /// The order now rests on the book.
    OrderPlaced {
        /// Identifier of the new order
        order_id: OrderId,
    },

    /// The order was cancelled.
    OrderCancelled {
        /// Identifier of the cancelled order
        order_id: OrderId,
        /// Quantity that was still open
        released: u64,
    },

    /// The trade was routed, possibly partially filled.
    TradeRouted {
        /// Base quantity exchanged
        filled: u64,
        /// Quote per unit of base over every leg
        average_price: f64,
        /// Improvement over the venue-only execution
        surplus: u128,
    },

    /// The command was rejected and had no effect.
    Rejected {
        /// Human-readable reason for the rejection.
        reason: String,
    },
}

impl SequencerResult {
    /// Whether the command was rejected.
    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// A sequenced event emitted after processing a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerEvent {
    /// Monotonically increasing sequence number, gap-free within one
    /// sequencer.
    pub sequence_num: u64,

    /// Wall-clock timestamp in nanoseconds since the Unix epoch.
    pub timestamp_ns: u64,

    /// The command that was executed.
    pub command: SequencerCommand,

    /// The result of executing the command.
    pub result: SequencerResult,
}
