//! Venue snapshots for persistence and recovery

use std::collections::BTreeSet;

use pricelevel::{Hash32, Side};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use super::book::HybridBook;
use super::bucket::Bucket;
use super::custody::Custody;
use super::error::HybridBookError;
use super::order::BucketKey;
use super::quantization::QuantizationConfig;
use super::venue::LiquidityVenue;
use crate::utils::current_time_millis;

/// Format version used for checksum-enabled venue snapshots.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// One order, open or closed. Its sequence is its position in the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Maker of the order
    pub maker: Hash32,
    /// Quantity originally placed
    pub total: u64,
    /// Quantity filled or cancelled
    pub filled: u64,
}

/// Every order ever placed at one price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    /// Discretized price index
    pub price_index: u32,
    /// Price the index represents
    pub price: u128,
    /// Orders in sequence order
    pub orders: Vec<OrderSnapshot>,
}

impl LevelSnapshot {
    /// Open quantity at this level.
    pub fn open_quantity(&self) -> u64 {
        self.orders
            .iter()
            .map(|order| order.total.saturating_sub(order.filled))
            .sum()
    }
}

/// Both sides of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSnapshot {
    /// Bucket key on the curve
    pub key: BucketKey,
    /// Inclusive lower bound
    pub lower: u128,
    /// Exclusive upper bound
    pub upper: u128,
    /// Bid levels by ascending index
    pub bids: Vec<LevelSnapshot>,
    /// Ask levels by ascending index
    pub asks: Vec<LevelSnapshot>,
}

/// The whole order book of a venue at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueSnapshot {
    /// Venue identifier
    pub venue_id: u32,

    /// Timestamp when the snapshot was created (milliseconds since epoch)
    pub timestamp: u64,

    /// Shared quantization, absent before the first placement
    pub quantization: Option<QuantizationConfig>,

    /// Buckets by ascending key
    pub buckets: Vec<BucketSnapshot>,
}

impl VenueSnapshot {
    fn levels(&self, side: Side) -> impl Iterator<Item = &LevelSnapshot> + '_ {
        self.buckets.iter().flat_map(move |bucket| match side {
            Side::Buy => bucket.bids.iter(),
            Side::Sell => bucket.asks.iter(),
        })
    }

    /// Highest price with an open bid.
    pub fn best_bid(&self) -> Option<u128> {
        let best = self
            .levels(Side::Buy)
            .filter(|level| level.open_quantity() > 0)
            .map(|level| level.price)
            .max();
        trace!("best_bid: {:?}", best);
        best
    }

    /// Lowest price with an open ask.
    pub fn best_ask(&self) -> Option<u128> {
        let best = self
            .levels(Side::Sell)
            .filter(|level| level.open_quantity() > 0)
            .map(|level| level.price)
            .min();
        trace!("best_ask: {:?}", best);
        best
    }

    /// Open quantity resting on `side`.
    pub fn open_quantity(&self, side: Side) -> u64 {
        self.levels(side).map(LevelSnapshot::open_quantity).sum()
    }
}

/// A snapshot with its format version and checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueSnapshotPackage {
    /// Version of the snapshot schema for forward compatibility.
    pub version: u32,
    /// Snapshot payload.
    pub snapshot: VenueSnapshot,
    /// Hex-encoded checksum of the serialized snapshot.
    pub checksum: String,
}

impl VenueSnapshotPackage {
    /// Creates a new snapshot package computing the checksum of the snapshot contents.
    pub fn new(snapshot: VenueSnapshot) -> Result<Self, HybridBookError> {
        let checksum = Self::compute_checksum(&snapshot)?;

        Ok(Self {
            version: SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    /// Serializes the package to JSON.
    pub fn to_json(&self) -> Result<String, HybridBookError> {
        serde_json::to_string(self).map_err(|error| HybridBookError::SerializationError {
            message: error.to_string(),
        })
    }

    /// Deserializes the package from JSON.
    pub fn from_json(data: &str) -> Result<Self, HybridBookError> {
        serde_json::from_str(data).map_err(|error| HybridBookError::DeserializationError {
            message: error.to_string(),
        })
    }

    /// Validates the checksum and version.
    pub fn validate(&self) -> Result<(), HybridBookError> {
        if self.version != SNAPSHOT_FORMAT_VERSION {
            return Err(HybridBookError::InvalidOperation {
                message: format!(
                    "Unsupported snapshot version: {} (expected {})",
                    self.version, SNAPSHOT_FORMAT_VERSION
                ),
            });
        }

        let computed = Self::compute_checksum(&self.snapshot)?;
        if computed != self.checksum {
            return Err(HybridBookError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }

        Ok(())
    }

    /// Consumes the package and returns the validated snapshot.
    pub fn into_snapshot(self) -> Result<VenueSnapshot, HybridBookError> {
        self.validate()?;
        Ok(self.snapshot)
    }

    fn compute_checksum(snapshot: &VenueSnapshot) -> Result<String, HybridBookError> {
        let payload =
            serde_json::to_vec(snapshot).map_err(|error| HybridBookError::SerializationError {
                message: error.to_string(),
            })?;

        let mut hasher = Sha256::new();
        hasher.update(payload);

        let checksum_bytes = hasher.finalize();
        Ok(format!("{:x}", checksum_bytes))
    }
}

fn capture_side(bucket: &Bucket, side: Side) -> Vec<LevelSnapshot> {
    bucket
        .side(side)
        .levels()
        .map(|(price_index, level)| LevelSnapshot {
            price_index,
            price: bucket.price_of(price_index),
            orders: level
                .orders()
                .iter()
                .map(|order| OrderSnapshot {
                    maker: order.maker,
                    total: order.total,
                    filled: order.filled,
                })
                .collect(),
        })
        .collect()
}

fn rebuild_side(
    bucket: &mut Bucket,
    side: Side,
    levels: &[LevelSnapshot],
    points: u32,
) -> Result<(), HybridBookError> {
    let mut seen = BTreeSet::new();
    for level in levels {
        if level.price_index >= points {
            return Err(HybridBookError::InvalidOperation {
                message: format!(
                    "level index {} outside {} price points",
                    level.price_index, points
                ),
            });
        }
        if !seen.insert(level.price_index) {
            return Err(HybridBookError::InvalidOperation {
                message: format!("level index {} appears twice", level.price_index),
            });
        }
        let price = bucket.price_of(level.price_index);
        if let Some(order) = level
            .orders
            .iter()
            .find(|order| price.checked_mul(u128::from(order.total)).is_none())
        {
            return Err(HybridBookError::InvalidQuantity {
                quantity: order.total,
            });
        }
        if let Some(order) = level.orders.iter().find(|order| order.filled > order.total) {
            return Err(HybridBookError::InvalidOperation {
                message: format!(
                    "order filled {} exceeds total {}",
                    order.filled, order.total
                ),
            });
        }
        let orders: Vec<(Hash32, u64, u64)> = level
            .orders
            .iter()
            .map(|order| (order.maker, order.total, order.filled))
            .collect();
        bucket
            .side_mut(side)
            .restore_level(level.price_index, &orders);
    }
    Ok(())
}

impl<V, C> HybridBook<V, C>
where
    V: LiquidityVenue,
    C: Custody,
{
    /// Captures every bucket, level and order, closed orders included, so
    /// restored identifiers stay valid.
    pub fn create_snapshot(&self) -> VenueSnapshot {
        let buckets = self
            .manager
            .buckets_sorted()
            .into_iter()
            .map(|bucket| BucketSnapshot {
                key: bucket.key(),
                lower: bucket.lower(),
                upper: bucket.upper(),
                bids: capture_side(bucket, Side::Buy),
                asks: capture_side(bucket, Side::Sell),
            })
            .collect();

        VenueSnapshot {
            venue_id: self.config.venue_id,
            timestamp: current_time_millis(),
            quantization: self.manager.quantization(),
            buckets,
        }
    }

    /// Captures a snapshot wrapped with a checksum.
    pub fn create_snapshot_package(&self) -> Result<VenueSnapshotPackage, HybridBookError> {
        VenueSnapshotPackage::new(self.create_snapshot())
    }

    /// Serializes a checksummed snapshot to JSON.
    pub fn snapshot_to_json(&self) -> Result<String, HybridBookError> {
        self.create_snapshot_package()?.to_json()
    }

    /// Replaces the order book with `snapshot`.
    ///
    /// Custody is not part of the snapshot; maker locks are expected to be
    /// restored alongside it. Nothing changes if validation fails.
    pub fn restore_from_snapshot(&mut self, snapshot: VenueSnapshot) -> Result<(), HybridBookError> {
        if snapshot.venue_id != self.config.venue_id {
            return Err(HybridBookError::VenueMismatch {
                expected: self.config.venue_id,
                found: snapshot.venue_id,
            });
        }
        let quantization = match (snapshot.quantization, snapshot.buckets.is_empty()) {
            (Some(config), _) => Some(config),
            (None, true) => None,
            (None, false) => {
                return Err(HybridBookError::InvalidOperation {
                    message: "snapshot holds buckets without quantization".to_string(),
                });
            }
        };

        let mut buckets = Vec::with_capacity(snapshot.buckets.len());
        if let Some(config) = quantization {
            config.validate()?;
            let mut keys = BTreeSet::new();
            for captured in &snapshot.buckets {
                if !keys.insert(captured.key) {
                    return Err(HybridBookError::InvalidOperation {
                        message: format!("bucket {} appears twice", captured.key),
                    });
                }
                if self.venue.bucket_bounds(captured.key) != Some((captured.lower, captured.upper))
                {
                    return Err(HybridBookError::InvalidOperation {
                        message: format!(
                            "bucket {} bounds [{}, {}) do not match the venue curve",
                            captured.key, captured.lower, captured.upper
                        ),
                    });
                }
                config.check_bounds(captured.lower, captured.upper)?;

                let mut bucket = Bucket::new(
                    self.config.venue_id,
                    captured.key,
                    captured.lower,
                    captured.upper,
                    &config,
                );
                rebuild_side(&mut bucket, Side::Buy, &captured.bids, config.points)?;
                rebuild_side(&mut bucket, Side::Sell, &captured.asks, config.points)?;
                buckets.push(bucket);
            }
        }

        self.manager.reset(quantization);
        let count = buckets.len();
        for bucket in buckets {
            self.manager.insert_bucket(bucket);
        }
        self.version += 1;
        debug!(
            "restored venue {} with {} buckets",
            self.config.venue_id, count
        );
        Ok(())
    }

    /// Validates and restores a checksummed snapshot.
    pub fn restore_from_snapshot_package(
        &mut self,
        package: VenueSnapshotPackage,
    ) -> Result<(), HybridBookError> {
        let snapshot = package.into_snapshot()?;
        self.restore_from_snapshot(snapshot)
    }

    /// Restores from JSON produced by [`snapshot_to_json`](Self::snapshot_to_json).
    pub fn restore_from_snapshot_json(&mut self, data: &str) -> Result<(), HybridBookError> {
        let package = VenueSnapshotPackage::from_json(data)?;
        self.restore_from_snapshot_package(package)
    }
}
