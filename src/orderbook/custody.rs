//! Balance custody consumed by placement and settlement.

use std::collections::HashMap;
use std::fmt;

use pricelevel::Hash32;
use serde::{Deserialize, Serialize};

/// The two assets of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// The traded asset, counted in order quantities
    Base,
    /// The pricing asset, counted in price times quantity
    Quote,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Base => write!(f, "base"),
            Asset::Quote => write!(f, "quote"),
        }
    }
}

/// Holds balances on behalf of makers and takers.
///
/// Locked funds back resting orders and in-flight trades; they are either
/// consumed by settlement or released back to the available balance.
pub trait Custody {
    /// Moves `amount` from available to locked. Returns false, changing
    /// nothing, if the available balance is short.
    fn lock_balance(&mut self, account: Hash32, asset: Asset, amount: u128) -> bool;

    /// Adds `amount` to the available balance.
    fn credit_balance(&mut self, account: Hash32, asset: Asset, amount: u128);

    /// Moves up to `amount` from locked back to available.
    fn release_lock(&mut self, account: Hash32, asset: Asset, amount: u128);

    /// Removes `amount` from the locked balance as it leaves the account.
    /// Returns false, changing nothing, if the locked balance is short.
    fn consume_lock(&mut self, account: Hash32, asset: Asset, amount: u128) -> bool;
}

/// Available and locked amounts of one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Spendable amount
    pub available: u128,
    /// Amount reserved for orders and trades
    pub locked: u128,
}

/// Custody backed by a hash map, for tests and simulations.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustody {
    balances: HashMap<(Hash32, Asset), Balance>,
}

impl InMemoryCustody {
    /// Creates empty custody.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits an account, alias of [`Custody::credit_balance`].
    pub fn deposit(&mut self, account: Hash32, asset: Asset, amount: u128) {
        self.credit_balance(account, asset, amount);
    }

    /// Balance of one asset.
    pub fn balance(&self, account: Hash32, asset: Asset) -> Balance {
        self.balances
            .get(&(account, asset))
            .copied()
            .unwrap_or_default()
    }

    /// Spendable amount of one asset.
    pub fn available(&self, account: Hash32, asset: Asset) -> u128 {
        self.balance(account, asset).available
    }

    /// Locked amount of one asset.
    pub fn locked(&self, account: Hash32, asset: Asset) -> u128 {
        self.balance(account, asset).locked
    }

    /// Sum of available and locked over all accounts for one asset.
    pub fn total(&self, asset: Asset) -> u128 {
        self.balances
            .iter()
            .filter(|((_, held), _)| *held == asset)
            .map(|(_, balance)| balance.available + balance.locked)
            .sum()
    }
}

impl Custody for InMemoryCustody {
    fn lock_balance(&mut self, account: Hash32, asset: Asset, amount: u128) -> bool {
        let Some(balance) = self
            .balances
            .get_mut(&(account, asset))
            .filter(|balance| balance.available >= amount)
        else {
            return amount == 0;
        };
        balance.available -= amount;
        balance.locked += amount;
        true
    }

    fn credit_balance(&mut self, account: Hash32, asset: Asset, amount: u128) {
        self.balances.entry((account, asset)).or_default().available += amount;
    }

    fn release_lock(&mut self, account: Hash32, asset: Asset, amount: u128) {
        let Some(balance) = self.balances.get_mut(&(account, asset)) else {
            return;
        };
        let released = amount.min(balance.locked);
        balance.locked -= released;
        balance.available += released;
    }

    fn consume_lock(&mut self, account: Hash32, asset: Asset, amount: u128) -> bool {
        let Some(balance) = self
            .balances
            .get_mut(&(account, asset))
            .filter(|balance| balance.locked >= amount)
        else {
            return amount == 0;
        };
        balance.locked -= amount;
        true
    }
}
