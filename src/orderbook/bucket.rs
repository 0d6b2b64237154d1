//! A price bucket aligned with the liquidity curve, holding both sides.

use pricelevel::{Hash32, Side};

use super::error::HybridBookError;
use super::order::{BucketKey, OrderId, OrderIdParts};
use super::price_index::PriceIndex;
use super::quantization::QuantizationConfig;

/// Bids and asks whose prices fall within `[lower, upper)`.
#[derive(Debug, Clone)]
pub struct Bucket {
    venue: u32,
    key: BucketKey,
    lower: u128,
    upper: u128,
    increment: u128,
    bids: PriceIndex,
    asks: PriceIndex,
}

impl Bucket {
    /// Creates an empty bucket discretized with `config`.
    pub fn new(
        venue: u32,
        key: BucketKey,
        lower: u128,
        upper: u128,
        config: &QuantizationConfig,
    ) -> Self {
        Self {
            venue,
            key,
            lower,
            upper,
            increment: config.increment,
            bids: PriceIndex::new(Side::Buy, config.points),
            asks: PriceIndex::new(Side::Sell, config.points),
        }
    }

    /// Bucket key on the curve.
    #[inline]
    pub fn key(&self) -> BucketKey {
        self.key
    }

    /// Inclusive lower price bound.
    #[inline]
    pub fn lower(&self) -> u128 {
        self.lower
    }

    /// Exclusive upper price bound.
    #[inline]
    pub fn upper(&self) -> u128 {
        self.upper
    }

    /// Venue identifier used when encoding order ids.
    #[inline]
    pub fn venue(&self) -> u32 {
        self.venue
    }

    /// Resting orders of `side`.
    #[inline]
    pub fn side(&self, side: Side) -> &PriceIndex {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Mutable access to the resting orders of `side`.
    #[inline]
    pub fn side_mut(&mut self, side: Side) -> &mut PriceIndex {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Price represented by `index`.
    #[inline]
    pub fn price_of(&self, index: u32) -> u128 {
        self.lower + u128::from(index) * self.increment
    }

    /// Index of `price`, rounded down to the grid.
    pub fn index_of(&self, price: u128) -> Result<u32, HybridBookError> {
        if price < self.lower || price >= self.upper {
            return Err(HybridBookError::PriceOutOfRange { price });
        }
        Ok(((price - self.lower) / self.increment) as u32)
    }

    /// Index range whose prices are no worse than `limit` for a taker
    /// consuming the `resting` side. `None` when no index qualifies.
    pub fn qualifying_range(&self, resting: Side, limit: u128) -> Option<(u32, u32)> {
        let last = self.side(resting).points().checked_sub(1)?;
        match resting {
            // taker sells, bids must pay at least `limit`
            Side::Buy => {
                if limit <= self.lower {
                    return Some((0, last));
                }
                if limit >= self.upper {
                    return None;
                }
                let floor = ((limit - self.lower) / self.increment) as u32;
                let lo = if self.price_of(floor) < limit {
                    floor + 1
                } else {
                    floor
                };
                (lo <= last).then_some((lo, last))
            }
            // taker buys, asks must cost at most `limit`
            Side::Sell => {
                if limit < self.lower {
                    return None;
                }
                if limit >= self.upper {
                    return Some((0, last));
                }
                let hi = (((limit - self.lower) / self.increment) as u32).min(last);
                Some((0, hi))
            }
        }
    }

    /// True when `price` is worse than `limit` for a taker consuming the
    /// `resting` side.
    #[inline]
    pub fn crosses_limit(resting: Side, price: u128, limit: u128) -> bool {
        match resting {
            Side::Buy => price < limit,
            Side::Sell => price > limit,
        }
    }

    /// Encodes the identifier of an order held in this bucket.
    #[inline]
    pub fn order_id(&self, side: Side, price_index: u32, sequence: u32) -> OrderId {
        OrderId::new(OrderIdParts {
            venue: self.venue,
            bucket: self.key,
            price_index,
            sequence,
            side,
        })
    }

    /// Places an order at a validated index.
    pub fn place(&mut self, side: Side, index: u32, quantity: u64, maker: Hash32) -> OrderId {
        let sequence = self.side_mut(side).place(index, quantity, maker);
        self.order_id(side, index, sequence)
    }

    /// Best price of `side`, flushing pending aggregates first.
    pub fn best_price(&mut self, side: Side) -> Option<u128> {
        let index = self.side_mut(side).best()?;
        Some(self.price_of(index))
    }

    /// True when neither side holds an open order.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Flushes both sides.
    pub fn flush(&mut self) {
        self.bids.flush_dirty();
        self.asks.flush_dirty();
    }
}
