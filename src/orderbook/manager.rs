/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Sharding of the book across curve-aligned price buckets.
//!
//! The manager owns every [`Bucket`], the shared [`QuantizationConfig`] and
//! one activity bitmap per side. A bucket's bit is set while that side of
//! the bucket holds at least one open order, so walks skip empty buckets in
//! `O(log n)`.
//!
//! Side conventions: placement and best-price queries take the side of the
//! resting order, matching and simulation take the side of the taker.

use std::collections::HashMap;

use pricelevel::{Hash32, Side};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::bitmap::BucketBitmap;
use super::bucket::Bucket;
use super::config::BookConfig;
use super::error::HybridBookError;
use super::matching::{MatchResult, StopReason, affordable};
use super::order::{BucketKey, Order, OrderId};
use super::price_index::CancelRejection;
use super::quantization::QuantizationConfig;
use super::venue::BucketCurve;

/// A validated placement, ready to commit without further checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPlan {
    /// Bucket receiving the order
    pub bucket: BucketKey,
    /// Lower bound of that bucket
    pub lower: u128,
    /// Upper bound of that bucket
    pub upper: u128,
    /// Discretized price index
    pub price_index: u32,
    /// Price after rounding down to the grid
    pub price: u128,
    /// Side of the order
    pub side: Side,
    /// Quantity placed
    pub quantity: u64,
    quantization: QuantizationConfig,
}

impl PlacementPlan {
    /// Quantization in effect once this plan commits.
    pub fn quantization(&self) -> QuantizationConfig {
        self.quantization
    }
}

/// Result of a successful cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CancelledOrder {
    /// Identifier of the cancelled order
    pub order_id: OrderId,
    /// Maker of the order
    pub maker: Hash32,
    /// Side of the order
    pub side: Side,
    /// Price of the order
    pub price: u128,
    /// Quantity that was still open
    pub released: u64,
}

/// Outcome of a read-only walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    /// Quantity the book could fill
    pub matchable: u64,
    /// Quote cost of that quantity
    pub cost: u128,
    /// Buckets visited
    pub buckets_scanned: usize,
    /// Why the walk stopped
    pub stop_reason: StopReason,
}

impl Simulation {
    /// Quantity-weighted average price, zero when nothing is matchable.
    pub fn average_price(&self) -> f64 {
        if self.matchable == 0 {
            0.0
        } else {
            self.cost as f64 / self.matchable as f64
        }
    }
}

/// Cheap depth estimate within the best bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenEstimate {
    /// Best opposing price, if any
    pub best_price: Option<u128>,
    /// Open quantity no worse than the limit in the best bucket
    pub depth: u64,
    /// Open orders holding that quantity
    pub orders: u64,
}

/// Owns all buckets of a venue.
#[derive(Debug, Clone)]
pub struct BucketManager {
    venue_id: u32,
    target_points: u32,
    max_buckets_per_match: usize,
    max_fills_per_match: usize,
    quantization: Option<QuantizationConfig>,
    buckets: HashMap<BucketKey, Bucket>,
    active_bids: BucketBitmap,
    active_asks: BucketBitmap,
}

impl BucketManager {
    /// Creates an empty manager.
    pub fn new(config: &BookConfig) -> Self {
        Self {
            venue_id: config.venue_id,
            target_points: config.target_price_points,
            max_buckets_per_match: config.max_buckets_per_match,
            max_fills_per_match: config.max_fills_per_match,
            quantization: None,
            buckets: HashMap::new(),
            active_bids: BucketBitmap::new(),
            active_asks: BucketBitmap::new(),
        }
    }

    /// Venue identifier encoded into order ids.
    #[inline]
    pub fn venue_id(&self) -> u32 {
        self.venue_id
    }

    /// Shared quantization, set by the first placement.
    #[inline]
    pub fn quantization(&self) -> Option<QuantizationConfig> {
        self.quantization
    }

    /// Number of buckets ever created.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// The bucket stored under `key`.
    pub fn bucket(&self, key: BucketKey) -> Option<&Bucket> {
        self.buckets.get(&key)
    }

    /// Every bucket, sorted by key.
    pub fn buckets_sorted(&self) -> Vec<&Bucket> {
        let mut buckets: Vec<&Bucket> = self.buckets.values().collect();
        buckets.sort_by_key(|bucket| bucket.key());
        buckets
    }

    /// Whether `key` is marked active for resting orders of `side`.
    pub fn is_active(&self, key: BucketKey, side: Side) -> bool {
        self.activity(side).is_set(key)
    }

    /// Active bucket keys for `side`, ascending.
    pub fn active_buckets(&self, side: Side) -> Vec<BucketKey> {
        self.activity(side).iter().collect()
    }

    fn activity(&self, side: Side) -> &BucketBitmap {
        match side {
            Side::Buy => &self.active_bids,
            Side::Sell => &self.active_asks,
        }
    }

    fn activity_mut(&mut self, side: Side) -> &mut BucketBitmap {
        match side {
            Side::Buy => &mut self.active_bids,
            Side::Sell => &mut self.active_asks,
        }
    }

    /// Best active bucket for resting `side`: highest bid, lowest ask.
    fn first_active(&self, side: Side) -> Option<BucketKey> {
        match side {
            Side::Buy => self.active_bids.last(),
            Side::Sell => self.active_asks.first(),
        }
    }

    /// Nearest active bucket at or beyond `from` in matching order.
    fn next_active(&self, side: Side, from: BucketKey) -> Option<BucketKey> {
        match side {
            Side::Buy => self.active_bids.prev_at_or_before(from),
            Side::Sell => self.active_asks.next_at_or_after(from),
        }
    }

    /// The bucket after `key` in matching order.
    fn step(side: Side, key: BucketKey) -> Option<BucketKey> {
        match side {
            Side::Buy => key.checked_sub(1),
            Side::Sell => key.checked_add(1),
        }
    }

    /// Validates a placement without touching any state.
    ///
    /// `pending` carries the quantization a not yet committed batch would
    /// establish, so every order of a batch is checked against it.
    pub fn plan_placement<C>(
        &self,
        curve: &C,
        price: u128,
        quantity: u64,
        side: Side,
        pending: Option<QuantizationConfig>,
    ) -> Result<PlacementPlan, HybridBookError>
    where
        C: BucketCurve + ?Sized,
    {
        if quantity == 0 {
            return Err(HybridBookError::InvalidQuantity { quantity });
        }
        let bucket = curve
            .bucket_for_price(price)
            .ok_or(HybridBookError::PriceOutOfRange { price })?;
        let (lower, upper) = curve
            .bucket_bounds(bucket)
            .ok_or(HybridBookError::PriceOutOfRange { price })?;

        let quantization = match self.quantization.or(pending) {
            Some(config) => {
                config.check_bounds(lower, upper)?;
                config
            }
            None => QuantizationConfig::from_bucket_bounds(lower, upper, self.target_points)?,
        };
        let price_index = quantization.price_to_index(price, lower, upper)?;
        let price = quantization.index_to_price(price_index, lower);
        if price.checked_mul(u128::from(quantity)).is_none() {
            return Err(HybridBookError::InvalidQuantity { quantity });
        }

        let level_full = self
            .buckets
            .get(&bucket)
            .and_then(|existing| existing.side(side).level(price_index))
            .is_some_and(|level| level.orders().len() >= u32::MAX as usize);
        if level_full {
            return Err(HybridBookError::InvalidOperation {
                message: format!("price level {price_index} in bucket {bucket} is full"),
            });
        }

        Ok(PlacementPlan {
            bucket,
            lower,
            upper,
            price_index,
            price,
            side,
            quantity,
            quantization,
        })
    }

    /// Applies a validated placement.
    pub fn commit_placement(&mut self, plan: &PlacementPlan, maker: Hash32) -> OrderId {
        if self.quantization.is_none() {
            self.quantization = Some(plan.quantization);
        }
        let venue = self.venue_id;
        let bucket = self.buckets.entry(plan.bucket).or_insert_with(|| {
            Bucket::new(venue, plan.bucket, plan.lower, plan.upper, &plan.quantization)
        });
        let order_id = bucket.place(plan.side, plan.price_index, plan.quantity, maker);
        self.activity_mut(plan.side).set(plan.bucket);
        trace!(
            "placed {} {} @ {} in bucket {} as {}",
            plan.side, plan.quantity, plan.price, plan.bucket, order_id
        );
        order_id
    }

    /// Places an order, creating its bucket on demand.
    pub fn place_order<C>(
        &mut self,
        curve: &C,
        price: u128,
        quantity: u64,
        side: Side,
        maker: Hash32,
    ) -> Result<OrderId, HybridBookError>
    where
        C: BucketCurve + ?Sized,
    {
        let plan = self.plan_placement(curve, price, quantity, side, None)?;
        Ok(self.commit_placement(&plan, maker))
    }

    /// Cancels an order on behalf of `caller`.
    pub fn cancel_order(
        &mut self,
        order_id: OrderId,
        caller: Hash32,
    ) -> Result<CancelledOrder, HybridBookError> {
        let parts = order_id.decode()?;
        if parts.venue != self.venue_id {
            return Err(HybridBookError::VenueMismatch {
                expected: self.venue_id,
                found: parts.venue,
            });
        }
        let raw = order_id.as_u128();
        let bucket = self
            .buckets
            .get_mut(&parts.bucket)
            .ok_or(HybridBookError::OrderNotFound { order_id: raw })?;

        let released = bucket
            .side_mut(parts.side)
            .cancel(parts.price_index, parts.sequence, caller)
            .map_err(|rejection| match rejection {
                CancelRejection::NotFound => HybridBookError::OrderNotFound { order_id: raw },
                CancelRejection::NotMaker => HybridBookError::NotMaker {
                    order_id: raw,
                    caller,
                },
                CancelRejection::AlreadyClosed => {
                    HybridBookError::AlreadyClosed { order_id: raw }
                }
            })?;
        let price = bucket.price_of(parts.price_index);
        let side_empty = bucket.side(parts.side).is_empty();
        if side_empty {
            self.activity_mut(parts.side).clear(parts.bucket);
        }

        Ok(CancelledOrder {
            order_id,
            maker: caller,
            side: parts.side,
            price,
            released,
        })
    }

    /// Looks up an order by identifier.
    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        let parts = order_id.decode().ok()?;
        if parts.venue != self.venue_id {
            return None;
        }
        self.buckets
            .get(&parts.bucket)?
            .side(parts.side)
            .order(parts.price_index, parts.sequence)
            .copied()
    }

    /// Price at which an order rests.
    pub fn order_price(&self, order_id: OrderId) -> Option<u128> {
        let parts = order_id.decode().ok()?;
        if parts.venue != self.venue_id {
            return None;
        }
        let bucket = self.buckets.get(&parts.bucket)?;
        Some(bucket.price_of(parts.price_index))
    }

    /// Best price of resting `side` and the bucket holding it.
    pub fn best_price(&mut self, side: Side) -> Option<(BucketKey, u128)> {
        let mut cursor = self.first_active(side);
        while let Some(key) = cursor {
            if let Some(price) = self
                .buckets
                .get_mut(&key)
                .and_then(|bucket| bucket.best_price(side))
            {
                return Some((key, price));
            }
            // stale bit, the bucket side holds nothing open
            self.activity_mut(side).clear(key);
            cursor = Self::step(side, key).and_then(|next| self.next_active(side, next));
        }
        None
    }

    /// Highest bid.
    pub fn best_bid(&mut self) -> Option<u128> {
        self.best_price(Side::Buy).map(|(_, price)| price)
    }

    /// Lowest ask.
    pub fn best_ask(&mut self) -> Option<u128> {
        self.best_price(Side::Sell).map(|(_, price)| price)
    }

    /// Open quantity and order count resting at `price`.
    pub fn depth_at<C>(
        &self,
        curve: &C,
        price: u128,
        side: Side,
    ) -> Result<(u64, usize), HybridBookError>
    where
        C: BucketCurve + ?Sized,
    {
        let key = curve
            .bucket_for_price(price)
            .ok_or(HybridBookError::PriceOutOfRange { price })?;
        let Some(bucket) = self.buckets.get(&key) else {
            return Ok((0, 0));
        };
        let index = bucket.index_of(price)?;
        Ok(bucket.side(side).depth_at_level(index))
    }

    /// Total open quantity of resting `side` from the aggregate trees.
    pub fn open_quantity(&mut self, side: Side) -> u64 {
        self.buckets
            .values_mut()
            .map(|bucket| bucket.side_mut(side).open_quantity())
            .sum()
    }

    /// Total open quantity of resting `side` by scanning every order.
    pub fn scanned_open_quantity(&self, side: Side) -> u64 {
        self.buckets
            .values()
            .map(|bucket| bucket.side(side).scanned_open_quantity())
            .sum()
    }

    /// Matches a taker of `side` across buckets.
    ///
    /// The walk starts at `start` (or the best active bucket) and moves in
    /// the improving direction. It stops when the quantity is filled, when
    /// a price is worse than `limit`, when liquidity runs out, or when one
    /// of the configured caps is reached. Hitting a cap is a partial fill,
    /// not an error.
    pub fn match_across_buckets(
        &mut self,
        side: Side,
        quantity: u64,
        start: Option<BucketKey>,
        limit: Option<u128>,
    ) -> Result<MatchResult, HybridBookError> {
        if quantity == 0 {
            return Err(HybridBookError::InvalidQuantity { quantity });
        }
        Ok(self.sweep(side, quantity, start, limit))
    }

    pub(crate) fn sweep(
        &mut self,
        side: Side,
        quantity: u64,
        start: Option<BucketKey>,
        limit: Option<u128>,
    ) -> MatchResult {
        let resting = side.opposite();
        let mut result = MatchResult::new(side, quantity);
        let mut cursor = match start {
            Some(key) => self.next_active(resting, key),
            None => self.first_active(resting),
        };

        while let Some(key) = cursor {
            if result.buckets_scanned >= self.max_buckets_per_match {
                warn!(
                    "match for {} {} stopped after {} buckets with {} remaining",
                    side,
                    quantity,
                    result.buckets_scanned,
                    result.remaining()
                );
                #[cfg(feature = "metrics")]
                metrics::counter!("hybrid_book_scan_cap_hits_total").increment(1);
                result.stop_reason = StopReason::ScanDepthExceeded;
                return result;
            }
            result.buckets_scanned += 1;

            let budget = self.max_fills_per_match - result.orders_touched;
            let Some(bucket) = self.buckets.get_mut(&key) else {
                self.activity_mut(resting).clear(key);
                cursor = Self::step(resting, key).and_then(|next| self.next_active(resting, next));
                continue;
            };

            let crossed = limit.is_some_and(|limit| {
                bucket
                    .best_price(resting)
                    .is_some_and(|best| Bucket::crosses_limit(resting, best, limit))
            });
            if crossed {
                result.stop_reason = StopReason::PriceLimit;
                return result;
            }

            let headroom = u128::MAX - result.total_cost;
            let partial =
                bucket.match_orders_within(side, result.remaining(), limit, budget, headroom);
            let stop = partial.stop_reason;
            let drained = bucket.side(resting).is_empty();
            trace!(
                "bucket {}: filled {} of {}, stop {:?}",
                key,
                partial.filled,
                partial.requested,
                stop
            );
            result.absorb(partial);
            if drained {
                self.activity_mut(resting).clear(key);
            }

            match stop {
                StopReason::Filled
                | StopReason::PriceLimit
                | StopReason::FillCapReached
                | StopReason::NotionalOverflow => {
                    result.stop_reason = stop;
                    return result;
                }
                StopReason::NoLiquidity | StopReason::ScanDepthExceeded => {}
            }
            cursor = Self::step(resting, key).and_then(|next| self.next_active(resting, next));
        }

        result.stop_reason = if result.is_complete() {
            StopReason::Filled
        } else {
            StopReason::NoLiquidity
        };
        result
    }

    /// Walks the book like [`match_across_buckets`](Self::match_across_buckets)
    /// from the best bucket without filling anything.
    ///
    /// Pending aggregates of the visited buckets are flushed, which does not
    /// change any observable quantity.
    pub fn simulate(&mut self, side: Side, quantity: u64, limit: Option<u128>) -> Simulation {
        let resting = side.opposite();
        let mut simulation = Simulation {
            matchable: 0,
            cost: 0,
            buckets_scanned: 0,
            stop_reason: if quantity == 0 {
                StopReason::Filled
            } else {
                StopReason::NoLiquidity
            },
        };
        if quantity == 0 {
            return simulation;
        }
        let mut touched = 0usize;
        let mut cursor = self.first_active(resting);

        while let Some(key) = cursor {
            if simulation.buckets_scanned >= self.max_buckets_per_match {
                simulation.stop_reason = StopReason::ScanDepthExceeded;
                return simulation;
            }
            simulation.buckets_scanned += 1;

            if let Some(bucket) = self.buckets.get_mut(&key) {
                bucket.side_mut(resting).flush_dirty();
                let bucket = &*bucket;
                let index = bucket.side(resting);
                let mut level = index.peek_best();

                while let Some(position) = level {
                    let price = bucket.price_of(position);
                    if limit.is_some_and(|limit| Bucket::crosses_limit(resting, price, limit)) {
                        simulation.stop_reason = StopReason::PriceLimit;
                        return simulation;
                    }
                    if let Some(price_level) = index.level(position) {
                        for order in price_level.open_orders() {
                            if touched >= self.max_fills_per_match {
                                simulation.stop_reason = StopReason::FillCapReached;
                                return simulation;
                            }
                            let wanted =
                                order.open_quantity().min(quantity - simulation.matchable);
                            let take = affordable(price, u128::MAX - simulation.cost, wanted);
                            if take == 0 {
                                simulation.stop_reason = StopReason::NotionalOverflow;
                                return simulation;
                            }
                            simulation.matchable += take;
                            simulation.cost += price * u128::from(take);
                            touched += 1;
                            if simulation.matchable == quantity {
                                simulation.stop_reason = StopReason::Filled;
                                return simulation;
                            }
                            if take < wanted {
                                simulation.stop_reason = if touched >= self.max_fills_per_match {
                                    StopReason::FillCapReached
                                } else {
                                    StopReason::NotionalOverflow
                                };
                                return simulation;
                            }
                        }
                    }
                    level = match resting {
                        Side::Buy => position.checked_sub(1),
                        Side::Sell => position.checked_add(1),
                    }
                    .and_then(|next| index.next_level_from(next));
                }
            }
            cursor = Self::step(resting, key).and_then(|next| self.next_active(resting, next));
        }
        simulation
    }

    /// Best opposing price for a taker of `side` and the depth no worse
    /// than `limit` inside its bucket, from the aggregate trees.
    pub fn screen(&mut self, side: Side, limit: u128) -> ScreenEstimate {
        let resting = side.opposite();
        let Some((key, best)) = self.best_price(resting) else {
            return ScreenEstimate::default();
        };
        let mut estimate = ScreenEstimate {
            best_price: Some(best),
            depth: 0,
            orders: 0,
        };
        if Bucket::crosses_limit(resting, best, limit) {
            return estimate;
        }
        let in_range = self.buckets.get_mut(&key).and_then(|bucket| {
            bucket
                .qualifying_range(resting, limit)
                .map(|(lo, hi)| bucket.side_mut(resting).depth_in_range(lo, hi))
        });
        if let Some((depth, orders)) = in_range {
            estimate.depth = depth;
            estimate.orders = orders;
        }
        estimate
    }

    /// Drops every bucket and installs `quantization`.
    pub(crate) fn reset(&mut self, quantization: Option<QuantizationConfig>) {
        self.quantization = quantization;
        self.buckets.clear();
        self.active_bids = BucketBitmap::new();
        self.active_asks = BucketBitmap::new();
    }

    /// Inserts a rebuilt bucket and marks its non-empty sides active.
    pub(crate) fn insert_bucket(&mut self, mut bucket: Bucket) {
        bucket.flush();
        let key = bucket.key();
        for side in [Side::Buy, Side::Sell] {
            if !bucket.side(side).is_empty() {
                self.activity_mut(side).set(key);
            }
        }
        self.buckets.insert(key, bucket);
    }
}
