//! Sequencer for total-ordered command processing.
//!
//! The engine itself performs no locking. A [`Sequencer`] owns one
//! [`HybridBook`], executes commands one at a time and stamps every outcome
//! with a gap-free sequence number, producing a log that can be replayed
//! against a book restored to the same starting state.
//!
//! # Types
//!
//! - [`SequencerCommand`]: commands submitted for sequenced execution
//! - [`SequencerEvent`]: sequenced events emitted after execution
//! - [`SequencerResult`]: outcomes of command execution

pub mod types;

pub use types::{SequencerCommand, SequencerEvent, SequencerResult};

use tracing::{debug, trace};

use super::book::HybridBook;
use super::custody::Custody;
use super::error::HybridBookError;
use super::venue::LiquidityVenue;
use crate::utils::current_time_nanos;

/// Single-threaded executor assigning sequence numbers to commands.
#[derive(Debug)]
pub struct Sequencer<V, C> {
    book: HybridBook<V, C>,
    next_sequence: u64,
}

impl<V, C> Sequencer<V, C>
where
    V: LiquidityVenue,
    C: Custody,
{
    /// Wraps `book`; the first event gets sequence number zero.
    pub fn new(book: HybridBook<V, C>) -> Self {
        Self {
            book,
            next_sequence: 0,
        }
    }

    /// The sequenced book.
    #[inline]
    pub fn book(&self) -> &HybridBook<V, C> {
        &self.book
    }

    /// Mutable access for deposits and queries that flush aggregates.
    /// Mutations made here are not sequenced.
    #[inline]
    pub fn book_mut(&mut self) -> &mut HybridBook<V, C> {
        &mut self.book
    }

    /// Releases the book.
    pub fn into_book(self) -> HybridBook<V, C> {
        self.book
    }

    /// Sequence number the next event will carry.
    #[inline]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    fn execute(&mut self, command: &SequencerCommand) -> SequencerResult {
        let outcome = match *command {
            SequencerCommand::PlaceOrder {
                maker,
                price,
                quantity,
                side,
            } => self
                .book
                .place_order(maker, price, quantity, side)
                .map(|order_id| SequencerResult::OrderPlaced { order_id }),
            SequencerCommand::CancelOrder { caller, order_id } => self
                .book
                .cancel_order(caller, order_id)
                .map(|cancelled| SequencerResult::OrderCancelled {
                    order_id: cancelled.order_id,
                    released: cancelled.released,
                }),
            SequencerCommand::RouteTrade {
                initiator,
                side,
                quantity,
            } => self
                .book
                .route_trade(initiator, side, quantity)
                .map(|outcome| SequencerResult::TradeRouted {
                    filled: outcome.filled,
                    average_price: outcome.average_price(),
                    surplus: outcome.surplus,
                }),
        };
        outcome.unwrap_or_else(|err| SequencerResult::Rejected {
            reason: err.to_string(),
        })
    }

    /// Executes `command` and returns its sequenced event.
    ///
    /// Rejected commands consume a sequence number too, so the log records
    /// every submission.
    pub fn submit(&mut self, command: SequencerCommand) -> SequencerEvent {
        let result = self.execute(&command);
        let event = SequencerEvent {
            sequence_num: self.next_sequence,
            timestamp_ns: current_time_nanos(),
            command,
            result,
        };
        self.next_sequence += 1;
        trace!("event {}: {:?}", event.sequence_num, event.result);
        event
    }

    /// Re-executes a recorded log and checks every outcome against it.
    ///
    /// The log must continue from [`next_sequence`](Self::next_sequence).
    /// Stops at the first gap or divergent result; commands before it stay
    /// applied.
    pub fn replay(&mut self, events: &[SequencerEvent]) -> Result<(), HybridBookError> {
        for event in events {
            if event.sequence_num != self.next_sequence {
                return Err(HybridBookError::InvalidOperation {
                    message: format!(
                        "replay expected sequence {}, found {}",
                        self.next_sequence, event.sequence_num
                    ),
                });
            }
            let result = self.execute(&event.command);
            self.next_sequence += 1;
            if result != event.result {
                return Err(HybridBookError::InvalidOperation {
                    message: format!(
                        "replay diverged at sequence {}: recorded {:?}, got {:?}",
                        event.sequence_num, event.result, result
                    ),
                });
            }
        }
        debug!("replayed {} events", events.len());
        Ok(())
    }
}
