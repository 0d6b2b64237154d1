//! A single discretized price within one bucket side.

use pricelevel::Hash32;

use super::order::Order;

/// One fill against a resting order, before it is tagged with its price
/// and identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LevelFill {
    pub sequence: u32,
    pub maker: Hash32,
    pub quantity: u64,
}

/// Append-only FIFO of orders at one price.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceLevel {
    orders: Vec<Order>,
    open_count: u32,
    /// First position that may still hold an open order
    head: usize,
    /// Quantity change not yet applied to the depth tree
    pub(crate) pending: i128,
    /// Queued for the next flush
    pub(crate) dirty: bool,
}

impl PriceLevel {
    /// Creates an empty level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every order placed at this level, closed ones included.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Looks up an order by its sequence number.
    pub fn order(&self, sequence: u32) -> Option<&Order> {
        self.orders.get(sequence as usize)
    }

    /// Number of orders that can still be matched.
    #[inline]
    pub fn open_count(&self) -> u32 {
        self.open_count
    }

    /// True when every order is closed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.open_count == 0
    }

    /// Open quantity and open order count, by scanning the order list.
    pub fn depth(&self) -> (u64, usize) {
        self.orders[self.head..]
            .iter()
            .filter(|order| order.is_open())
            .fold((0, 0), |(quantity, count), order| {
                (quantity + order.open_quantity(), count + 1)
            })
    }

    /// Open orders oldest first.
    pub fn open_orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders[self.head..].iter().filter(|order| order.is_open())
    }

    /// Appends an order and returns its sequence number.
    pub(crate) fn push(&mut self, maker: Hash32, quantity: u64) -> u32 {
        let sequence = self.orders.len() as u32;
        self.orders.push(Order {
            maker,
            total: quantity,
            filled: 0,
            sequence,
        });
        self.open_count += 1;
        sequence
    }

    /// Re-appends an order carried over from a snapshot.
    pub(crate) fn push_restored(&mut self, maker: Hash32, total: u64, filled: u64) {
        let sequence = self.orders.len() as u32;
        self.orders.push(Order {
            maker,
            total,
            filled: filled.min(total),
            sequence,
        });
        if filled < total {
            self.open_count += 1;
        } else if self.head + 1 == self.orders.len() {
            self.head += 1;
        }
    }

    /// Closes an order, returning the quantity that was still open.
    pub(crate) fn close(&mut self, sequence: u32) -> Option<u64> {
        let order = self
            .orders
            .get_mut(sequence as usize)
            .filter(|order| order.is_open())?;
        let remaining = order.open_quantity();
        order.filled = order.total;
        self.open_count -= 1;
        Some(remaining)
    }

    /// Fills up to `quantity` from the oldest open orders, touching at most
    /// `max_orders` of them.
    pub(crate) fn fill(
        &mut self,
        quantity: u64,
        max_orders: usize,
        fills: &mut Vec<LevelFill>,
    ) -> u64 {
        let mut remaining = quantity;
        let mut touched = 0;

        while remaining > 0 && touched < max_orders && self.head < self.orders.len() {
            let order = &mut self.orders[self.head];
            if !order.is_open() {
                self.head += 1;
                continue;
            }

            let take = remaining.min(order.open_quantity());
            order.filled += take;
            remaining -= take;
            touched += 1;
            fills.push(LevelFill {
                sequence: order.sequence,
                maker: order.maker,
                quantity: take,
            });

            if !order.is_open() {
                self.open_count -= 1;
                self.head += 1;
            }
        }

        quantity - remaining
    }
}
