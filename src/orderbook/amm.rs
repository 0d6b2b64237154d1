//! Constant-product reference venue.
//!
//! Buys are exact-output (the trader names the base received), sells are
//! exact-input (the trader names the base paid). Fees are charged on the
//! input side and stay in the pool.

use pricelevel::Side;
use tracing::trace;

use super::error::HybridBookError;
use super::order::BucketKey;
use super::venue::{BucketCurve, LinearBucketCurve, LiquidityVenue, VenueFill};

const BPS_DENOMINATOR: u128 = 10_000;

/// An `x * y = k` pool of base and quote reserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantProductPool {
    base_reserve: u128,
    quote_reserve: u128,
    fee_bps: u32,
    curve: LinearBucketCurve,
}

impl ConstantProductPool {
    /// Creates a pool with the given reserves, fee and bucket layout.
    pub fn new(
        base_reserve: u128,
        quote_reserve: u128,
        fee_bps: u32,
        curve: LinearBucketCurve,
    ) -> Result<Self, HybridBookError> {
        if base_reserve == 0 || quote_reserve == 0 {
            return Err(HybridBookError::InvalidConfiguration {
                message: "pool reserves must be non-zero".to_string(),
            });
        }
        if u128::from(fee_bps) >= BPS_DENOMINATOR {
            return Err(HybridBookError::InvalidConfiguration {
                message: format!("fee of {fee_bps} bps is not below 100%"),
            });
        }
        base_reserve
            .checked_mul(quote_reserve)
            .ok_or_else(|| HybridBookError::InvalidConfiguration {
                message: "pool invariant overflows".to_string(),
            })?;
        Ok(Self {
            base_reserve,
            quote_reserve,
            fee_bps,
            curve,
        })
    }

    /// Base held by the pool.
    #[inline]
    pub fn base_reserve(&self) -> u128 {
        self.base_reserve
    }

    /// Quote held by the pool.
    #[inline]
    pub fn quote_reserve(&self) -> u128 {
        self.quote_reserve
    }

    /// Swap fee in basis points.
    #[inline]
    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    /// The bucket layout of this pool.
    #[inline]
    pub fn curve(&self) -> &LinearBucketCurve {
        &self.curve
    }

    fn overflow() -> HybridBookError {
        HybridBookError::Venue {
            message: "arithmetic overflow in pool".to_string(),
        }
    }

    fn invariant(&self) -> Result<u128, HybridBookError> {
        self.base_reserve
            .checked_mul(self.quote_reserve)
            .ok_or_else(Self::overflow)
    }

    /// Quote to pay for `quantity` base, fee included.
    fn buy_cost(&self, quantity: u64) -> Result<u128, HybridBookError> {
        let quantity = u128::from(quantity);
        if quantity >= self.base_reserve {
            return Err(HybridBookError::InsufficientLiquidity {
                side: Side::Buy,
                requested: quantity as u64,
                available: self.available_liquidity(),
            });
        }
        let new_base = self.base_reserve - quantity;
        let new_quote = self.invariant()?.div_ceil(new_base);
        let net_in = new_quote - self.quote_reserve;
        let gross = net_in
            .checked_mul(BPS_DENOMINATOR)
            .ok_or_else(Self::overflow)?
            .div_ceil(BPS_DENOMINATOR - u128::from(self.fee_bps));
        Ok(gross)
    }

    /// Quote received for `quantity` base, fee deducted.
    fn sell_proceeds(&self, quantity: u64) -> Result<u128, HybridBookError> {
        let net_in = u128::from(quantity)
            .checked_mul(BPS_DENOMINATOR - u128::from(self.fee_bps))
            .ok_or_else(Self::overflow)?
            / BPS_DENOMINATOR;
        let new_base = self
            .base_reserve
            .checked_add(net_in)
            .ok_or_else(Self::overflow)?;
        let new_quote = self.invariant()?.div_ceil(new_base);
        Ok(self.quote_reserve.saturating_sub(new_quote))
    }
}

impl BucketCurve for ConstantProductPool {
    fn bucket_for_price(&self, price: u128) -> Option<BucketKey> {
        self.curve.bucket_for_price(price)
    }

    fn bucket_bounds(&self, bucket: BucketKey) -> Option<(u128, u128)> {
        self.curve.bucket_bounds(bucket)
    }
}

impl LiquidityVenue for ConstantProductPool {
    fn current_reference_price(&self) -> u128 {
        self.quote_reserve / self.base_reserve
    }

    fn available_liquidity(&self) -> u64 {
        u64::try_from(self.base_reserve - 1).unwrap_or(u64::MAX)
    }

    fn quote_trade(&self, side: Side, quantity: u64) -> Result<VenueFill, HybridBookError> {
        if quantity == 0 {
            return Err(HybridBookError::InvalidQuantity { quantity });
        }
        let fill = match side {
            Side::Buy => VenueFill::new(side, self.buy_cost(quantity)?, u128::from(quantity)),
            Side::Sell => VenueFill::new(side, u128::from(quantity), self.sell_proceeds(quantity)?),
        };
        Ok(fill)
    }

    fn execute_trade(&mut self, side: Side, quantity: u64) -> Result<VenueFill, HybridBookError> {
        let fill = self.quote_trade(side, quantity)?;
        match side {
            Side::Buy => {
                self.base_reserve -= fill.amount_out;
                self.quote_reserve += fill.amount_in;
            }
            Side::Sell => {
                self.base_reserve += fill.amount_in;
                self.quote_reserve -= fill.amount_out;
            }
        }
        trace!(
            "pool {} {}: in {} out {} reserves {}/{}",
            side,
            quantity,
            fill.amount_in,
            fill.amount_out,
            self.base_reserve,
            self.quote_reserve
        );
        Ok(fill)
    }
}
