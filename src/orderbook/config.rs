//! Book configuration.

use serde::{Deserialize, Serialize};

use super::error::HybridBookError;
use super::quantization::{DEFAULT_PRICE_POINTS, MAX_PRICE_POINTS};

/// Default number of buckets a single match may visit.
pub const DEFAULT_MAX_BUCKETS_PER_MATCH: usize = 16;

/// Default number of resting orders a single match may touch.
pub const DEFAULT_MAX_FILLS_PER_MATCH: usize = 512;

/// Default number of orders accepted in one placement batch.
pub const DEFAULT_MAX_ORDERS_PER_BATCH: usize = 64;

/// Tunables of a hybrid book.
///
/// # Examples
/// ```
/// use hybrid_orderbook::BookConfig;
///
/// let config = BookConfig::default()
///     .with_venue_id(7)
///     .with_max_buckets_per_match(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Venue identifier encoded into every order id
    pub venue_id: u32,
    /// Desired number of price points per bucket
    pub target_price_points: u32,
    /// Bucket scan cap per match call
    pub max_buckets_per_match: usize,
    /// Resting orders touched per match call
    pub max_fills_per_match: usize,
    /// Orders accepted per placement batch
    pub max_orders_per_batch: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            venue_id: 0,
            target_price_points: DEFAULT_PRICE_POINTS,
            max_buckets_per_match: DEFAULT_MAX_BUCKETS_PER_MATCH,
            max_fills_per_match: DEFAULT_MAX_FILLS_PER_MATCH,
            max_orders_per_batch: DEFAULT_MAX_ORDERS_PER_BATCH,
        }
    }
}

impl BookConfig {
    /// Sets the venue identifier.
    pub fn with_venue_id(mut self, venue_id: u32) -> Self {
        self.venue_id = venue_id;
        self
    }

    /// Sets the target number of price points per bucket.
    pub fn with_target_price_points(mut self, points: u32) -> Self {
        self.target_price_points = points;
        self
    }

    /// Sets the bucket scan cap.
    pub fn with_max_buckets_per_match(mut self, buckets: usize) -> Self {
        self.max_buckets_per_match = buckets;
        self
    }

    /// Sets the fill cap.
    pub fn with_max_fills_per_match(mut self, fills: usize) -> Self {
        self.max_fills_per_match = fills;
        self
    }

    /// Sets the batch size cap.
    pub fn with_max_orders_per_batch(mut self, orders: usize) -> Self {
        self.max_orders_per_batch = orders;
        self
    }

    /// Checks every bound.
    pub fn validate(&self) -> Result<(), HybridBookError> {
        if self.target_price_points == 0 || self.target_price_points > MAX_PRICE_POINTS {
            return Err(HybridBookError::InvalidConfiguration {
                message: format!(
                    "target_price_points {} must be in 1..={MAX_PRICE_POINTS}",
                    self.target_price_points
                ),
            });
        }
        if self.max_buckets_per_match == 0 {
            return Err(HybridBookError::InvalidConfiguration {
                message: "max_buckets_per_match must be positive".to_string(),
            });
        }
        if self.max_fills_per_match == 0 {
            return Err(HybridBookError::InvalidConfiguration {
                message: "max_fills_per_match must be positive".to_string(),
            });
        }
        if self.max_orders_per_batch == 0 {
            return Err(HybridBookError::InvalidConfiguration {
                message: "max_orders_per_batch must be positive".to_string(),
            });
        }
        Ok(())
    }
}
