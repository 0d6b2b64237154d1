//! Price discretization shared by every bucket of a venue.
//!
//! The first bucket ever created fixes the increment and the number of
//! points; later buckets reuse them relative to their own lower bound.

use serde::{Deserialize, Serialize};

use super::error::HybridBookError;

/// Default number of discretized points per bucket.
pub const DEFAULT_PRICE_POINTS: u32 = 1024;

/// Upper bound on points per bucket. Price indices are encoded in 24 bits
/// of an order id, this keeps bitmaps small as well.
pub const MAX_PRICE_POINTS: u32 = 1 << 16;

/// Increment and resolution derived from the first bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantizationConfig {
    /// Lower bound of the first bucket
    pub min_price: u128,
    /// Exclusive upper bound of the first bucket
    pub max_price: u128,
    /// Distance between adjacent discretized prices
    pub increment: u128,
    /// Number of discretized prices per bucket
    pub points: u32,
}

impl QuantizationConfig {
    /// Derives the configuration from the bounds of a bucket.
    pub fn from_bucket_bounds(
        lower: u128,
        upper: u128,
        target_points: u32,
    ) -> Result<Self, HybridBookError> {
        if upper <= lower {
            return Err(HybridBookError::InvalidOperation {
                message: format!("empty bucket bounds [{lower}, {upper})"),
            });
        }
        if target_points == 0 || target_points > MAX_PRICE_POINTS {
            return Err(HybridBookError::InvalidConfiguration {
                message: format!(
                    "target price points {target_points} must be in 1..={MAX_PRICE_POINTS}"
                ),
            });
        }

        let width = upper - lower;
        let increment = width.div_ceil(u128::from(target_points));
        let points = width.div_ceil(increment);

        Ok(Self {
            min_price: lower,
            max_price: upper,
            increment,
            // points <= target_points because increment >= width / target
            points: points as u32,
        })
    }

    /// Checks that the fields are consistent with each other, as
    /// [`from_bucket_bounds`](Self::from_bucket_bounds) would produce them.
    pub fn validate(&self) -> Result<(), HybridBookError> {
        let consistent = self.max_price > self.min_price
            && self.increment > 0
            && self.points > 0
            && self.points <= MAX_PRICE_POINTS
            && self.bucket_width().div_ceil(self.increment) == u128::from(self.points);
        if !consistent {
            return Err(HybridBookError::InvalidConfiguration {
                message: format!(
                    "inconsistent quantization: [{}, {}) with increment {} and {} points",
                    self.min_price, self.max_price, self.increment, self.points
                ),
            });
        }
        Ok(())
    }

    /// Width of every bucket sharing this configuration.
    #[inline]
    pub fn bucket_width(&self) -> u128 {
        self.max_price - self.min_price
    }

    /// Checks that a bucket has the same width as the first one.
    pub fn check_bounds(&self, lower: u128, upper: u128) -> Result<(), HybridBookError> {
        if upper <= lower || upper - lower != self.bucket_width() {
            return Err(HybridBookError::InvalidOperation {
                message: format!(
                    "bucket [{lower}, {upper}) does not match quantized width {}",
                    self.bucket_width()
                ),
            });
        }
        Ok(())
    }

    /// Maps a price into an index relative to `lower`, rounding down.
    pub fn price_to_index(
        &self,
        price: u128,
        lower: u128,
        upper: u128,
    ) -> Result<u32, HybridBookError> {
        if price < lower || price >= upper {
            return Err(HybridBookError::PriceOutOfRange { price });
        }
        let index = (price - lower) / self.increment;
        // price < upper and width <= increment * points
        Ok(index as u32)
    }

    /// Maps an index back to the price it represents within a bucket.
    #[inline]
    pub fn index_to_price(&self, index: u32, lower: u128) -> u128 {
        lower + u128::from(index) * self.increment
    }

    /// Rounds a price down to the increment grid of the bucket at `lower`.
    #[inline]
    pub fn quantize(&self, price: u128, lower: u128) -> u128 {
        lower + (price.saturating_sub(lower) / self.increment) * self.increment
    }
}
