//! Resting orders and their composite identifiers.

use std::fmt;

use pricelevel::{Hash32, Side};
use serde::{Deserialize, Serialize};

use super::error::HybridBookError;

/// Key of a price bucket on the liquidity curve.
pub type BucketKey = i32;

const SIDE_BITS: u32 = 1;
const SEQUENCE_BITS: u32 = 32;
const PRICE_INDEX_BITS: u32 = 24;
const BUCKET_BITS: u32 = 32;
const VENUE_BITS: u32 = 32;

const SEQUENCE_SHIFT: u32 = SIDE_BITS;
const PRICE_INDEX_SHIFT: u32 = SEQUENCE_SHIFT + SEQUENCE_BITS;
const BUCKET_SHIFT: u32 = PRICE_INDEX_SHIFT + PRICE_INDEX_BITS;
const VENUE_SHIFT: u32 = BUCKET_SHIFT + BUCKET_BITS;
const USED_BITS: u32 = VENUE_SHIFT + VENUE_BITS;

/// Largest price index an identifier can carry.
pub const MAX_ENCODED_PRICE_INDEX: u32 = (1 << PRICE_INDEX_BITS) - 1;

/// A resting order inside a price level.
///
/// Closed orders stay in the level as history; cancellation marks them by
/// setting `filled` equal to `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Account that placed the order
    pub maker: Hash32,
    /// Quantity originally placed
    pub total: u64,
    /// Quantity filled or cancelled so far
    pub filled: u64,
    /// Position within the level, the FIFO priority
    pub sequence: u32,
}

impl Order {
    /// Quantity still available to takers.
    #[inline]
    pub fn open_quantity(&self) -> u64 {
        self.total - self.filled
    }

    /// True while the order can still be matched.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.filled < self.total
    }
}

/// Decoded fields of an [`OrderId`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderIdParts {
    /// Venue that issued the identifier
    pub venue: u32,
    /// Bucket holding the order
    pub bucket: BucketKey,
    /// Discretized price within the bucket
    pub price_index: u32,
    /// Position within the price level
    pub sequence: u32,
    /// Side of the resting order
    pub side: Side,
}

/// Stateless composite identifier of a resting order.
///
/// Layout from the most significant bit: venue (32), bucket as
/// offset-binary (32), price index (24), sequence (32), side (1). The top
/// seven bits are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u128);

impl OrderId {
    /// Packs the parts into an identifier.
    ///
    /// Price indices above [`MAX_ENCODED_PRICE_INDEX`] do not occur because
    /// buckets never exceed the maximum number of price points.
    pub fn new(parts: OrderIdParts) -> Self {
        debug_assert!(parts.price_index <= MAX_ENCODED_PRICE_INDEX);
        let side_bit: u128 = match parts.side {
            Side::Buy => 0,
            Side::Sell => 1,
        };
        let bucket = (parts.bucket as u32 ^ 0x8000_0000) as u128;
        let price_index = (parts.price_index & MAX_ENCODED_PRICE_INDEX) as u128;

        Self(
            (parts.venue as u128) << VENUE_SHIFT
                | bucket << BUCKET_SHIFT
                | price_index << PRICE_INDEX_SHIFT
                | (parts.sequence as u128) << SEQUENCE_SHIFT
                | side_bit,
        )
    }

    /// Wraps a raw value without validation.
    #[inline]
    pub fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    #[inline]
    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// Unpacks the identifier.
    pub fn decode(&self) -> Result<OrderIdParts, HybridBookError> {
        if self.0 >> USED_BITS != 0 {
            return Err(HybridBookError::InvalidOrderId { order_id: self.0 });
        }
        let side = if self.0 & 1 == 0 { Side::Buy } else { Side::Sell };
        let sequence = (self.0 >> SEQUENCE_SHIFT) as u32;
        let price_index = (self.0 >> PRICE_INDEX_SHIFT) as u32 & MAX_ENCODED_PRICE_INDEX;
        let bucket = ((self.0 >> BUCKET_SHIFT) as u32 ^ 0x8000_0000) as i32;
        let venue = (self.0 >> VENUE_SHIFT) as u32;

        Ok(OrderIdParts {
            venue,
            bucket,
            price_index,
            sequence,
            side,
        })
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#034x}", self.0)
    }
}

impl From<OrderId> for u128 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}
