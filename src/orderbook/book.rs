//! Caller-facing hybrid book: the bucketed order book, its venue and custody.

use pricelevel::{Hash32, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::config::BookConfig;
use super::custody::{Asset, Custody};
use super::error::HybridBookError;
use super::manager::{BucketManager, CancelledOrder, PlacementPlan};
use super::order::{Order, OrderId};
use super::venue::LiquidityVenue;

/// One order of a placement batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Limit price
    pub price: u128,
    /// Base quantity
    pub quantity: u64,
    /// Side of the order
    pub side: Side,
}

impl OrderRequest {
    /// Creates a request.
    pub fn new(price: u128, quantity: u64, side: Side) -> Self {
        Self {
            price,
            quantity,
            side,
        }
    }
}

/// A limit order book sharded along a liquidity venue's curve.
///
/// Every mutating call either completes or leaves the book, the venue and
/// custody untouched. Each completed mutation bumps [`version`](Self::version),
/// which route plans use to detect that the book moved underneath them.
#[derive(Debug)]
pub struct HybridBook<V, C> {
    pub(super) config: BookConfig,
    pub(super) manager: BucketManager,
    pub(super) venue: V,
    pub(super) custody: C,
    pub(super) version: u64,
}

impl<V, C> HybridBook<V, C>
where
    V: LiquidityVenue,
    C: Custody,
{
    /// Creates an empty book over `venue`.
    pub fn new(config: BookConfig, venue: V, custody: C) -> Result<Self, HybridBookError> {
        config.validate()?;
        debug!("hybrid book for venue {} created", config.venue_id);
        Ok(Self {
            manager: BucketManager::new(&config),
            config,
            venue,
            custody,
            version: 0,
        })
    }

    /// Configuration of this book.
    #[inline]
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// The bucket manager, for inspection.
    #[inline]
    pub fn manager(&self) -> &BucketManager {
        &self.manager
    }

    /// The alternative venue.
    #[inline]
    pub fn venue(&self) -> &V {
        &self.venue
    }

    /// Custody holding every balance.
    #[inline]
    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Mutable custody, for deposits.
    #[inline]
    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    /// State version, bumped by every completed mutation.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Asset and amount a maker locks for a planned order.
    fn maker_lock(plan: &PlacementPlan) -> Result<(Asset, u128), HybridBookError> {
        match plan.side {
            Side::Sell => Ok((Asset::Base, u128::from(plan.quantity))),
            Side::Buy => plan
                .price
                .checked_mul(u128::from(plan.quantity))
                .map(|amount| (Asset::Quote, amount))
                .ok_or(HybridBookError::InvalidQuantity {
                    quantity: plan.quantity,
                }),
        }
    }

    /// Places a resting limit order for `maker`.
    ///
    /// The price is rounded down to the bucket grid. Asks lock `quantity`
    /// base; bids lock price times quantity in quote.
    pub fn place_order(
        &mut self,
        maker: Hash32,
        price: u128,
        quantity: u64,
        side: Side,
    ) -> Result<OrderId, HybridBookError> {
        let plan = self
            .manager
            .plan_placement(&self.venue, price, quantity, side, None)?;
        let (asset, amount) = Self::maker_lock(&plan)?;
        if !self.custody.lock_balance(maker, asset, amount) {
            return Err(HybridBookError::InsufficientBalance {
                account: maker,
                asset,
                required: amount,
            });
        }
        let order_id = self.manager.commit_placement(&plan, maker);
        self.version += 1;
        Ok(order_id)
    }

    /// Places several orders for one maker, all or nothing.
    pub fn place_orders_batch(
        &mut self,
        maker: Hash32,
        requests: &[OrderRequest],
    ) -> Result<Vec<OrderId>, HybridBookError> {
        if requests.is_empty() || requests.len() > self.config.max_orders_per_batch {
            return Err(HybridBookError::InvalidOperation {
                message: format!(
                    "batch of {} orders, expected 1..={}",
                    requests.len(),
                    self.config.max_orders_per_batch
                ),
            });
        }

        let mut plans = Vec::with_capacity(requests.len());
        let mut pending = self.manager.quantization();
        let mut base_total: u128 = 0;
        let mut quote_total: u128 = 0;
        for request in requests {
            let plan = self.manager.plan_placement(
                &self.venue,
                request.price,
                request.quantity,
                request.side,
                pending,
            )?;
            pending = Some(plan.quantization());
            let (asset, amount) = Self::maker_lock(&plan)?;
            let total = match asset {
                Asset::Base => &mut base_total,
                Asset::Quote => &mut quote_total,
            };
            *total = total
                .checked_add(amount)
                .ok_or(HybridBookError::InvalidQuantity {
                    quantity: request.quantity,
                })?;
            plans.push(plan);
        }

        if !self.custody.lock_balance(maker, Asset::Base, base_total) {
            return Err(HybridBookError::InsufficientBalance {
                account: maker,
                asset: Asset::Base,
                required: base_total,
            });
        }
        if !self.custody.lock_balance(maker, Asset::Quote, quote_total) {
            self.custody.release_lock(maker, Asset::Base, base_total);
            return Err(HybridBookError::InsufficientBalance {
                account: maker,
                asset: Asset::Quote,
                required: quote_total,
            });
        }

        let order_ids = plans
            .iter()
            .map(|plan| self.manager.commit_placement(plan, maker))
            .collect::<Vec<_>>();
        self.version += 1;
        trace!("placed batch of {} orders for {}", order_ids.len(), maker);
        Ok(order_ids)
    }

    /// Cancels an order and releases the maker's remaining lock.
    pub fn cancel_order(
        &mut self,
        caller: Hash32,
        order_id: OrderId,
    ) -> Result<CancelledOrder, HybridBookError> {
        let cancelled = self.manager.cancel_order(order_id, caller)?;
        let (asset, amount) = match cancelled.side {
            Side::Sell => (Asset::Base, u128::from(cancelled.released)),
            Side::Buy => (Asset::Quote, cancelled.price * u128::from(cancelled.released)),
        };
        self.custody.release_lock(caller, asset, amount);
        self.version += 1;
        Ok(cancelled)
    }

    /// Looks up an order.
    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.manager.order(order_id)
    }

    /// Highest resting bid.
    pub fn best_bid(&mut self) -> Option<u128> {
        self.manager.best_bid()
    }

    /// Lowest resting ask.
    pub fn best_ask(&mut self) -> Option<u128> {
        self.manager.best_ask()
    }

    /// Best ask minus best bid, when both exist.
    pub fn spread(&mut self) -> Option<u128> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some(ask.saturating_sub(bid))
    }

    /// Open quantity and order count resting on `side` at `price`.
    pub fn depth_at(&self, price: u128, side: Side) -> Result<(u64, usize), HybridBookError> {
        self.manager.depth_at(&self.venue, price, side)
    }

    /// Total open quantity resting on `side`.
    pub fn open_quantity(&mut self, side: Side) -> u64 {
        self.manager.open_quantity(side)
    }
}
