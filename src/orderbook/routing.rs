//! Trade routing between the order book and the alternative venue.
//!
//! A route runs in two phases. [`HybridBook::prepare_route`] estimates the
//! venue price, screens book depth that improves on it and splits the
//! quantity, without changing anything. [`HybridBook::settle_route`]
//! executes the venue leg first, then matches the book leg limited by the
//! price the venue actually delivered, and settles every balance.
//!
//! Because every book fill is priced no worse than the venue leg executed
//! before it, the initiator pays no more (or receives no less) than the
//! venue alone would have charged for the whole trade. The difference is
//! the surplus.

use pricelevel::{Hash32, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::book::HybridBook;
use super::custody::{Asset, Custody};
use super::error::HybridBookError;
use super::matching::MatchResult;
use super::venue::{LiquidityVenue, VenueFill};

/// How the book leg of a route was sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenDecision {
    /// No resting order improves on the venue
    NoImprovement,
    /// The best bucket alone covers the trade
    BestBucket,
    /// A read-only walk across buckets sized the leg
    Walked,
}

/// Result of the estimate, screen and decide phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Direction of the initiator
    pub side: Side,
    /// Base quantity requested
    pub quantity: u64,
    /// Venue marginal price when the plan was made
    pub reference_price: u128,
    /// Book price bound used while screening
    pub screen_limit: u128,
    /// Venue quote for the whole quantity
    pub counterfactual: VenueFill,
    /// How the book leg was sized
    pub screen: ScreenDecision,
    /// Quantity routed to the book
    pub book_quantity: u64,
    /// Quantity routed to the venue
    pub venue_quantity: u64,
    /// Expected quote amount of the book leg, when a walk computed it
    pub expected_book_cost: Option<u128>,
    /// Expected blended price, when a walk computed it
    pub expected_average_price: Option<f64>,
    /// Book version the plan was made against
    pub version: u64,
}

/// Result of an executed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOutcome {
    /// Direction of the initiator
    pub side: Side,
    /// Base quantity requested
    pub requested: u64,
    /// Base quantity exchanged
    pub filled: u64,
    /// Quote amount paid or received over every leg
    pub quote_amount: u128,
    /// Quote amount the venue alone would have charged or paid
    pub counterfactual_quote: u128,
    /// Improvement over the venue-only execution, never negative
    pub surplus: u128,
    /// Book leg
    pub book: MatchResult,
    /// Venue leg, executed before the book leg
    pub venue_fill: Option<VenueFill>,
    /// Venue top-up for any book shortfall
    pub top_up: Option<VenueFill>,
}

impl RouteOutcome {
    /// Quote per unit of base over every leg, zero when nothing filled.
    pub fn average_price(&self) -> f64 {
        if self.filled == 0 {
            0.0
        } else {
            self.quote_amount as f64 / self.filled as f64
        }
    }

    /// Quantity left unfilled.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.requested - self.filled
    }
}

impl<V, C> HybridBook<V, C>
where
    V: LiquidityVenue,
    C: Custody,
{
    /// Estimates, screens and splits a trade without mutating anything
    /// observable.
    pub fn prepare_route(&mut self, side: Side, quantity: u64) -> Result<RoutePlan, HybridBookError> {
        if quantity == 0 {
            return Err(HybridBookError::InvalidQuantity { quantity });
        }
        let reference_price = self.venue.current_reference_price();
        let counterfactual = self.venue.quote_trade(side, quantity)?;

        // buyers take asks at or below the reference, sellers hit bids
        // strictly above it
        let screen_limit = match side {
            Side::Buy => reference_price,
            Side::Sell => reference_price.saturating_add(1),
        };

        let estimate = self.manager.screen(side, screen_limit);
        let (screen, book_quantity, expected_book_cost) = if estimate.depth == 0 {
            (ScreenDecision::NoImprovement, 0, Some(0))
        } else if estimate.depth >= quantity
            && estimate.orders <= self.config.max_fills_per_match as u64
        {
            (ScreenDecision::BestBucket, quantity, None)
        } else {
            let simulation = self.manager.simulate(side, quantity, Some(screen_limit));
            (
                ScreenDecision::Walked,
                simulation.matchable,
                Some(simulation.cost),
            )
        };
        let venue_quantity = quantity - book_quantity;

        let expected_average_price = expected_book_cost.and_then(|book_cost| {
            let venue_quote = if venue_quantity == 0 {
                0
            } else {
                self.venue
                    .quote_trade(side, venue_quantity)
                    .ok()?
                    .quote_amount(side)
            };
            Some((book_cost + venue_quote) as f64 / quantity as f64)
        });

        debug!(
            "route plan {} {}: book {} venue {} ({:?}), reference {}",
            side, quantity, book_quantity, venue_quantity, screen, reference_price
        );

        Ok(RoutePlan {
            side,
            quantity,
            reference_price,
            screen_limit,
            counterfactual,
            screen,
            book_quantity,
            venue_quantity,
            expected_book_cost,
            expected_average_price,
            version: self.version,
        })
    }

    /// Executes a plan for `initiator` and settles every balance.
    ///
    /// Fails without side effects if the plan is stale, if the initiator
    /// cannot lock the counterfactual amount, or if the venue leg fails.
    pub fn settle_route(
        &mut self,
        initiator: Hash32,
        plan: &RoutePlan,
    ) -> Result<RouteOutcome, HybridBookError> {
        if plan.version != self.version {
            return Err(HybridBookError::StalePlan {
                planned: plan.version,
                current: self.version,
            });
        }
        let side = plan.side;
        let (lock_asset, lock_amount) = match side {
            Side::Buy => (Asset::Quote, plan.counterfactual.amount_in),
            Side::Sell => (Asset::Base, u128::from(plan.quantity)),
        };
        if !self.custody.lock_balance(initiator, lock_asset, lock_amount) {
            return Err(HybridBookError::InsufficientBalance {
                account: initiator,
                asset: lock_asset,
                required: lock_amount,
            });
        }

        let venue_fill = if plan.venue_quantity > 0 {
            match self.venue.execute_trade(side, plan.venue_quantity) {
                Ok(fill) => Some(fill),
                Err(err) => {
                    self.custody.release_lock(initiator, lock_asset, lock_amount);
                    return Err(err);
                }
            }
        } else {
            None
        };

        let limit = venue_fill
            .as_ref()
            .unwrap_or(&plan.counterfactual)
            .price_limit(side);
        let book = if plan.book_quantity > 0 {
            self.manager
                .sweep(side, plan.book_quantity, None, Some(limit))
        } else {
            MatchResult::new(side, 0)
        };

        let shortfall = plan.book_quantity - book.filled;
        let top_up = if shortfall > 0 {
            warn!(
                "book filled {} of {} planned ({:?}), topping up {} on the venue",
                book.filled, plan.book_quantity, book.stop_reason, shortfall
            );
            match self.venue.execute_trade(side, shortfall) {
                Ok(fill) => Some(fill),
                Err(err) => {
                    warn!("venue top-up of {} failed: {}", shortfall, err);
                    None
                }
            }
        } else {
            None
        };

        self.settle_makers(&book);

        let mut base_exchanged = u128::from(book.filled);
        let mut quote_exchanged = book.total_cost;
        for leg in venue_fill.iter().chain(top_up.iter()) {
            base_exchanged += leg.base_amount(side);
            quote_exchanged += leg.quote_amount(side);
        }
        self.settle_initiator(
            initiator,
            side,
            lock_amount,
            base_exchanged,
            quote_exchanged,
        );

        let counterfactual_quote = plan.counterfactual.quote_amount(side);
        let surplus = if base_exchanged == u128::from(plan.quantity) {
            let raw = match side {
                Side::Buy => counterfactual_quote as i128 - quote_exchanged as i128,
                Side::Sell => quote_exchanged as i128 - counterfactual_quote as i128,
            };
            if raw < 0 {
                error!(
                    "negative routing surplus {} for {} {}: venue-only {} vs executed {}",
                    raw, side, plan.quantity, counterfactual_quote, quote_exchanged
                );
                0
            } else {
                raw as u128
            }
        } else {
            0
        };

        #[cfg(feature = "metrics")]
        {
            metrics::counter!("hybrid_book_routes_total").increment(1);
            metrics::counter!("hybrid_book_surplus_total")
                .increment(u64::try_from(surplus).unwrap_or(u64::MAX));
        }

        self.version += 1;
        debug!(
            "route {} {}: filled {}, book {}, quote {}, surplus {}",
            side, plan.quantity, base_exchanged, book.filled, quote_exchanged, surplus
        );

        Ok(RouteOutcome {
            side,
            requested: plan.quantity,
            filled: base_exchanged as u64,
            quote_amount: quote_exchanged,
            counterfactual_quote,
            surplus,
            book,
            venue_fill,
            top_up,
        })
    }

    /// Prepares and settles a route in one call.
    pub fn route_trade(
        &mut self,
        initiator: Hash32,
        side: Side,
        quantity: u64,
    ) -> Result<RouteOutcome, HybridBookError> {
        let plan = self.prepare_route(side, quantity)?;
        self.settle_route(initiator, &plan)
    }

    /// Pays every maker touched by the book leg out of its placement lock.
    fn settle_makers(&mut self, book: &MatchResult) {
        for fill in &book.fills {
            let base = u128::from(fill.quantity);
            let quote = fill.notional();
            let (paid, received) = match book.side {
                // taker buys, maker delivers base
                Side::Buy => ((Asset::Base, base), (Asset::Quote, quote)),
                Side::Sell => ((Asset::Quote, quote), (Asset::Base, base)),
            };
            if !self.custody.consume_lock(fill.maker, paid.0, paid.1) {
                error!(
                    "maker {} lock short of {} {} for order {}",
                    fill.maker, paid.1, paid.0, fill.order_id
                );
            }
            self.custody.credit_balance(fill.maker, received.0, received.1);
        }
    }

    /// Spends the initiator's lock, credits what it bought and releases
    /// the unspent rest.
    fn settle_initiator(
        &mut self,
        initiator: Hash32,
        side: Side,
        locked: u128,
        base_exchanged: u128,
        quote_exchanged: u128,
    ) {
        let (paid_asset, paid, received_asset, received) = match side {
            Side::Buy => (Asset::Quote, quote_exchanged, Asset::Base, base_exchanged),
            Side::Sell => (Asset::Base, base_exchanged, Asset::Quote, quote_exchanged),
        };
        let from_lock = paid.min(locked);
        if !self.custody.consume_lock(initiator, paid_asset, from_lock) {
            error!("initiator {} lock vanished during settlement", initiator);
        }
        let excess = paid - from_lock;
        if excess > 0 {
            error!(
                "initiator {} paid {} {} above its lock",
                initiator, excess, paid_asset
            );
            if !(self.custody.lock_balance(initiator, paid_asset, excess)
                && self.custody.consume_lock(initiator, paid_asset, excess))
            {
                error!("initiator {} cannot cover {} {}", initiator, excess, paid_asset);
            }
        }
        self.custody.credit_balance(initiator, received_asset, received);
        self.custody
            .release_lock(initiator, paid_asset, locked - from_lock);
    }
}
