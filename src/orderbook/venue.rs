//! Interfaces consumed from the alternative liquidity venue.
//!
//! The book never owns pricing logic for the venue. It reads a reference
//! price, asks for quotes, and hands over the portion of a trade the book
//! cannot fill better. Buckets are laid out along the venue's curve via
//! [`BucketCurve`].

use pricelevel::Side;
use serde::{Deserialize, Serialize};

use super::error::HybridBookError;
use super::order::BucketKey;

/// Discretization of the price axis into buckets.
///
/// Keys must be monotonic in price: every price in bucket `k + 1` is
/// above every price in bucket `k`. Cross-bucket walks and the activity
/// bitmaps rely on key order matching price order.
pub trait BucketCurve {
    /// Bucket containing `price`, if the curve covers it.
    fn bucket_for_price(&self, price: u128) -> Option<BucketKey>;

    /// Bounds `[lower, upper)` of `bucket`.
    fn bucket_bounds(&self, bucket: BucketKey) -> Option<(u128, u128)>;
}

/// Result of a venue swap, quoted or executed.
///
/// `side` is the direction of the trader: a buyer pays quote and receives
/// base, a seller pays base and receives quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueFill {
    /// Amount paid into the venue
    pub amount_in: u128,
    /// Amount received from the venue
    pub amount_out: u128,
    /// Average quote paid or received per unit of base, rounded down
    pub realized_price: u128,
}

impl VenueFill {
    /// Builds a fill and derives its realized price.
    pub fn new(side: Side, amount_in: u128, amount_out: u128) -> Self {
        let (quote, base) = match side {
            Side::Buy => (amount_in, amount_out),
            Side::Sell => (amount_out, amount_in),
        };
        Self {
            amount_in,
            amount_out,
            realized_price: quote.checked_div(base).unwrap_or(0),
        }
    }

    /// Base quantity exchanged.
    #[inline]
    pub fn base_amount(&self, side: Side) -> u128 {
        match side {
            Side::Buy => self.amount_out,
            Side::Sell => self.amount_in,
        }
    }

    /// Quote amount exchanged.
    #[inline]
    pub fn quote_amount(&self, side: Side) -> u128 {
        match side {
            Side::Buy => self.amount_in,
            Side::Sell => self.amount_out,
        }
    }

    /// Book price limit no worse than this fill for the trader: rounded
    /// down for a buyer, up for a seller.
    pub fn price_limit(&self, side: Side) -> u128 {
        let quote = self.quote_amount(side);
        let base = self.base_amount(side);
        if base == 0 {
            return 0;
        }
        match side {
            Side::Buy => quote / base,
            Side::Sell => quote.div_ceil(base),
        }
    }
}

/// An external liquidity source the book routes around.
pub trait LiquidityVenue: BucketCurve {
    /// Current marginal price of base in quote, rounded down.
    fn current_reference_price(&self) -> u128;

    /// Base quantity the venue can deliver.
    fn available_liquidity(&self) -> u64;

    /// Prices a trade without executing it.
    fn quote_trade(&self, side: Side, quantity: u64) -> Result<VenueFill, HybridBookError>;

    /// Executes a trade of `quantity` base units.
    fn execute_trade(&mut self, side: Side, quantity: u64) -> Result<VenueFill, HybridBookError>;
}

/// Buckets of equal width starting at `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearBucketCurve {
    origin: u128,
    width: u128,
    count: u32,
}

impl LinearBucketCurve {
    /// Creates a curve of `count` buckets of `width` starting at `origin`.
    pub fn new(origin: u128, width: u128, count: u32) -> Result<Self, HybridBookError> {
        if width == 0 || count == 0 || count > i32::MAX as u32 {
            return Err(HybridBookError::InvalidConfiguration {
                message: format!("invalid bucket curve: width {width}, count {count}"),
            });
        }
        width
            .checked_mul(u128::from(count))
            .and_then(|span| span.checked_add(origin))
            .ok_or_else(|| HybridBookError::InvalidConfiguration {
                message: "bucket curve exceeds the price domain".to_string(),
            })?;
        Ok(Self {
            origin,
            width,
            count,
        })
    }

    /// Width of each bucket.
    #[inline]
    pub fn width(&self) -> u128 {
        self.width
    }

    /// Lowest covered price.
    #[inline]
    pub fn origin(&self) -> u128 {
        self.origin
    }

    /// Exclusive upper end of the covered range.
    #[inline]
    pub fn end(&self) -> u128 {
        self.origin + self.width * u128::from(self.count)
    }
}

impl BucketCurve for LinearBucketCurve {
    fn bucket_for_price(&self, price: u128) -> Option<BucketKey> {
        if price < self.origin || price >= self.end() {
            return None;
        }
        Some(((price - self.origin) / self.width) as BucketKey)
    }

    fn bucket_bounds(&self, bucket: BucketKey) -> Option<(u128, u128)> {
        let index = u32::try_from(bucket).ok()?;
        if index >= self.count {
            return None;
        }
        let lower = self.origin + self.width * u128::from(index);
        Some((lower, lower + self.width))
    }
}
