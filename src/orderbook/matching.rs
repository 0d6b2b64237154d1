//! Price-time priority matching within a bucket.

use pricelevel::{Hash32, Side};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::bucket::Bucket;
use super::level::LevelFill;
use super::order::OrderId;

/// Why a match call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The requested quantity was filled
    Filled,
    /// No resting order remained on the opposite side
    NoLiquidity,
    /// The next best price was worse than the limit
    PriceLimit,
    /// The bucket scan cap was reached
    ScanDepthExceeded,
    /// The per-call fill cap was reached
    FillCapReached,
    /// The next fill would push the accumulated notional past `u128::MAX`
    NotionalOverflow,
}

/// A fill against one resting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Identifier of the resting order
    pub order_id: OrderId,
    /// Maker of the resting order
    pub maker: Hash32,
    /// Quantity filled
    pub quantity: u64,
    /// Execution price
    pub price: u128,
}

impl Fill {
    /// Quote amount exchanged by this fill.
    #[inline]
    pub fn notional(&self) -> u128 {
        self.price.saturating_mul(u128::from(self.quantity))
    }
}

/// Outcome of a match call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Side of the taker
    pub side: Side,
    /// Quantity asked for
    pub requested: u64,
    /// Quantity filled
    pub filled: u64,
    /// Sum of price times quantity over all fills
    pub total_cost: u128,
    /// Number of resting orders touched
    pub orders_touched: usize,
    /// Number of buckets visited
    pub buckets_scanned: usize,
    /// Fills in execution order
    pub fills: Vec<Fill>,
    /// Why matching stopped
    pub stop_reason: StopReason,
}

impl MatchResult {
    /// An empty result for a taker of `side` asking for `requested`.
    pub fn new(side: Side, requested: u64) -> Self {
        Self {
            side,
            requested,
            filled: 0,
            total_cost: 0,
            orders_touched: 0,
            buckets_scanned: 0,
            fills: Vec::new(),
            stop_reason: if requested == 0 {
                StopReason::Filled
            } else {
                StopReason::NoLiquidity
            },
        }
    }

    /// Quantity left unfilled.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.requested - self.filled
    }

    /// True when nothing is left.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.filled == self.requested
    }

    /// Quantity-weighted average price, zero when nothing filled.
    pub fn average_price(&self) -> f64 {
        if self.filled == 0 {
            0.0
        } else {
            self.total_cost as f64 / self.filled as f64
        }
    }

    /// Folds a per-bucket result into this one. Stop reason is left to the
    /// caller.
    pub(crate) fn absorb(&mut self, other: MatchResult) {
        self.filled += other.filled;
        self.total_cost += other.total_cost;
        self.orders_touched += other.orders_touched;
        self.fills.extend(other.fills);
    }

    fn record(&mut self, bucket: &Bucket, resting: Side, index: u32, fills: &[LevelFill]) {
        let price = bucket.price_of(index);
        // callers cap each level by the notional headroom, so this cannot wrap
        for fill in fills {
            self.filled += fill.quantity;
            self.total_cost += price * u128::from(fill.quantity);
            self.orders_touched += 1;
            self.fills.push(Fill {
                order_id: bucket.order_id(resting, index, fill.sequence),
                maker: fill.maker,
                quantity: fill.quantity,
                price,
            });
        }
    }
}

/// Largest quantity up to `wanted` whose cost at `price` fits in
/// `headroom`.
pub(crate) fn affordable(price: u128, headroom: u128, wanted: u64) -> u64 {
    match headroom.checked_div(price) {
        Some(units) => u64::try_from(units).map_or(wanted, |units| units.min(wanted)),
        None => wanted,
    }
}

impl Bucket {
    /// Matches a taker of `side` against the opposite resting side.
    ///
    /// Levels are consumed best first and orders oldest first. With a
    /// `limit`, matching stops at the first level priced worse than it.
    /// At most `max_orders` resting orders are touched.
    pub fn match_orders(
        &mut self,
        side: Side,
        quantity: u64,
        limit: Option<u128>,
        max_orders: usize,
    ) -> MatchResult {
        self.match_orders_within(side, quantity, limit, max_orders, u128::MAX)
    }

    /// Like [`match_orders`](Self::match_orders), but the total cost of the
    /// result never exceeds `max_cost`.
    pub(crate) fn match_orders_within(
        &mut self,
        side: Side,
        quantity: u64,
        limit: Option<u128>,
        max_orders: usize,
        max_cost: u128,
    ) -> MatchResult {
        let resting = side.opposite();
        let mut result = MatchResult::new(side, quantity);
        let mut scratch = Vec::new();

        while result.filled < quantity {
            if result.orders_touched >= max_orders {
                result.stop_reason = StopReason::FillCapReached;
                return result;
            }
            let Some(index) = self.side_mut(resting).best() else {
                result.stop_reason = StopReason::NoLiquidity;
                return result;
            };
            let price = self.price_of(index);
            if limit.is_some_and(|limit| Bucket::crosses_limit(resting, price, limit)) {
                result.stop_reason = StopReason::PriceLimit;
                return result;
            }

            let wanted = affordable(price, max_cost - result.total_cost, quantity - result.filled);
            if wanted == 0 {
                result.stop_reason = StopReason::NotionalOverflow;
                return result;
            }

            scratch.clear();
            let budget = max_orders - result.orders_touched;
            let filled = self
                .side_mut(resting)
                .fill_level(index, wanted, budget, &mut scratch);
            trace!(
                "bucket {}: filled {} at {} across {} orders",
                self.key(),
                filled,
                price,
                scratch.len()
            );
            result.record(self, resting, index, &scratch);
            if filled == 0 {
                result.stop_reason = StopReason::NoLiquidity;
                return result;
            }
        }

        result.stop_reason = StopReason::Filled;
        result
    }
}
