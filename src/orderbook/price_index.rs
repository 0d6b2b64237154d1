//! One side of a bucket: orders keyed by discretized price.
//!
//! Placement sets the existence bit right away and queues the level in a
//! dirty list; the depth and word-occupancy trees catch up on
//! [`PriceIndex::flush_dirty`]. Cancellation and fills update everything
//! eagerly. Every query that reads the trees flushes first.

use std::collections::BTreeMap;

use pricelevel::{Hash32, Side};
use tracing::trace;

use super::bitmap::{Fenwick, LevelBitmap};
use super::level::{LevelFill, PriceLevel};
use super::order::Order;

/// Why a cancellation was refused at the index level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelRejection {
    /// No order at that level and sequence
    NotFound,
    /// Caller is not the maker
    NotMaker,
    /// Order is already filled or cancelled
    AlreadyClosed,
}

/// Orders of one side of one bucket.
#[derive(Debug, Clone)]
pub struct PriceIndex {
    side: Side,
    levels: BTreeMap<u32, PriceLevel>,
    bitmap: LevelBitmap,
    depth: Fenwick,
    order_counts: Fenwick,
    dirty: Vec<u32>,
}

impl PriceIndex {
    /// Creates an empty index for resting orders of `side`.
    pub fn new(side: Side, points: u32) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            bitmap: LevelBitmap::new(points),
            depth: Fenwick::new(points as usize),
            order_counts: Fenwick::new(points as usize),
            dirty: Vec::new(),
        }
    }

    /// Side of the orders held here.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of discretized prices.
    #[inline]
    pub fn points(&self) -> u32 {
        self.bitmap.points()
    }

    /// True when no order is open.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    /// Number of levels with open orders.
    #[inline]
    pub fn live_levels(&self) -> u32 {
        self.bitmap.count()
    }

    /// Number of levels waiting for a flush.
    #[inline]
    pub fn pending_levels(&self) -> usize {
        self.dirty.len()
    }

    /// The level at `index`, if any order was ever placed there.
    pub fn level(&self, index: u32) -> Option<&PriceLevel> {
        self.levels.get(&index)
    }

    /// Levels with any history, in ascending index order.
    pub fn levels(&self) -> impl Iterator<Item = (u32, &PriceLevel)> + '_ {
        self.levels.iter().map(|(&index, level)| (index, level))
    }

    /// Looks up an order.
    pub fn order(&self, index: u32, sequence: u32) -> Option<&Order> {
        self.levels.get(&index)?.order(sequence)
    }

    /// Appends an order at `index` and returns its sequence number.
    ///
    /// The caller validates quantity and index.
    pub fn place(&mut self, index: u32, quantity: u64, maker: Hash32) -> u32 {
        debug_assert!(quantity > 0 && index < self.points());
        let level = self.levels.entry(index).or_default();
        let sequence = level.push(maker, quantity);
        level.pending += i128::from(quantity);
        if !level.dirty {
            level.dirty = true;
            self.dirty.push(index);
        }
        self.order_counts.add(index as usize, 1);
        self.bitmap.set(index);
        trace!(
            "price index {}: placed seq {} at level {} qty {}",
            self.side, sequence, index, quantity
        );
        sequence
    }

    /// Closes an order on behalf of `caller` and returns the quantity that
    /// was still open.
    pub fn cancel(
        &mut self,
        index: u32,
        sequence: u32,
        caller: Hash32,
    ) -> Result<u64, CancelRejection> {
        let level = self
            .levels
            .get_mut(&index)
            .ok_or(CancelRejection::NotFound)?;
        let order = level.order(sequence).ok_or(CancelRejection::NotFound)?;
        if order.maker != caller {
            return Err(CancelRejection::NotMaker);
        }
        if !order.is_open() {
            return Err(CancelRejection::AlreadyClosed);
        }

        let released = level.close(sequence).ok_or(CancelRejection::NotFound)?;
        let delta = -i128::from(released);
        if level.dirty {
            level.pending += delta;
        } else {
            self.depth.add(index as usize, delta);
        }
        self.order_counts.add(index as usize, -1);
        if level.is_exhausted() {
            self.bitmap.clear(index);
        }
        trace!(
            "price index {}: cancelled seq {} at level {} released {}",
            self.side, sequence, index, released
        );
        Ok(released)
    }

    /// Applies every queued level change to the aggregate trees.
    pub fn flush_dirty(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        let dirty = std::mem::take(&mut self.dirty);
        for &index in &dirty {
            if let Some(level) = self.levels.get_mut(&index) {
                self.depth.add(index as usize, level.pending);
                level.pending = 0;
                level.dirty = false;
            }
            self.bitmap.sync_word(index);
        }
        // reuse the allocation for the next batch of placements
        self.dirty = dirty;
        self.dirty.clear();
    }

    /// Best level: highest for bids, lowest for asks.
    pub fn best(&mut self) -> Option<u32> {
        self.flush_dirty();
        self.peek_best()
    }

    /// Best level without flushing. Only exact after a flush.
    pub fn peek_best(&self) -> Option<u32> {
        match self.side {
            Side::Buy => self.bitmap.last(),
            Side::Sell => self.bitmap.first(),
        }
    }

    /// Next live level at or beyond `index` in matching order.
    pub fn next_level_from(&self, index: u32) -> Option<u32> {
        match self.side {
            Side::Buy => self.bitmap.prev_at_or_before(index),
            Side::Sell => self.bitmap.next_at_or_after(index),
        }
    }

    /// Open quantity and order count at one level, by scanning its orders.
    pub fn depth_at_level(&self, index: u32) -> (u64, usize) {
        self.levels
            .get(&index)
            .map_or((0, 0), |level| level.depth())
    }

    /// Open quantity and open order count across `lo..=hi`.
    pub fn depth_in_range(&mut self, lo: u32, hi: u32) -> (u64, u64) {
        self.flush_dirty();
        let quantity = self.depth.range_sum(lo as usize, hi as usize);
        let orders = self.order_counts.range_sum(lo as usize, hi as usize);
        (quantity as u64, orders as u64)
    }

    /// Total open quantity from the aggregate tree.
    pub fn open_quantity(&mut self) -> u64 {
        self.flush_dirty();
        self.depth.total() as u64
    }

    /// Total open quantity by scanning every order.
    pub fn scanned_open_quantity(&self) -> u64 {
        self.levels.values().map(|level| level.depth().0).sum()
    }

    /// Fills up to `quantity` at `index`. The side must be flushed.
    pub(crate) fn fill_level(
        &mut self,
        index: u32,
        quantity: u64,
        max_orders: usize,
        fills: &mut Vec<LevelFill>,
    ) -> u64 {
        let Some(level) = self.levels.get_mut(&index) else {
            return 0;
        };
        let start = fills.len();
        let filled = level.fill(quantity, max_orders, fills);
        let closed = fills[start..]
            .iter()
            .filter(|fill| {
                level
                    .order(fill.sequence)
                    .is_some_and(|order| !order.is_open())
            })
            .count();

        self.depth.add(index as usize, -i128::from(filled));
        self.order_counts.add(index as usize, -(closed as i128));
        if level.is_exhausted() {
            self.bitmap.clear(index);
        }
        filled
    }

    /// Rebuilds a level from snapshot data.
    pub(crate) fn restore_level(&mut self, index: u32, orders: &[(Hash32, u64, u64)]) {
        let level = self.levels.entry(index).or_default();
        for &(maker, total, filled) in orders {
            level.push_restored(maker, total, filled);
        }
        let (open, count) = level.depth();
        level.pending += i128::from(open);
        if !level.dirty {
            level.dirty = true;
            self.dirty.push(index);
        }
        self.order_counts.add(index as usize, count as i128);
        if !level.is_exhausted() {
            self.bitmap.set(index);
        }
    }
}
