//! Hybrid book error types

use pricelevel::{Hash32, Side};
use thiserror::Error;

use super::custody::Asset;

/// Errors that can occur within the hybrid book.
///
/// Every variant is raised before any state is mutated, so a failed call
/// leaves the book, the venue and custody exactly as they were.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum HybridBookError {
    /// Quantity is zero or an arithmetic product overflowed
    #[error("invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: u64,
    },

    /// Price falls outside the range covered by the curve or its bucket
    #[error("price {price} is outside the covered range")]
    PriceOutOfRange {
        /// The rejected price
        price: u128,
    },

    /// The caller does not own the order
    #[error("caller {caller} is not the maker of order {order_id}")]
    NotMaker {
        /// Encoded identifier of the order
        order_id: u128,
        /// Account that attempted the operation
        caller: Hash32,
    },

    /// The order is already fully filled or cancelled
    #[error("order {order_id} is already closed")]
    AlreadyClosed {
        /// Encoded identifier of the order
        order_id: u128,
    },

    /// No order exists at the decoded location
    #[error("order not found: {order_id}")]
    OrderNotFound {
        /// Encoded identifier of the order
        order_id: u128,
    },

    /// The identifier does not decode to a valid layout
    #[error("invalid order id: {order_id:#x}")]
    InvalidOrderId {
        /// The raw identifier value
        order_id: u128,
    },

    /// The identifier belongs to another venue
    #[error("order id venue {found} does not match venue {expected}")]
    VenueMismatch {
        /// Venue configured on this book
        expected: u32,
        /// Venue encoded in the identifier
        found: u32,
    },

    /// Custody refused to lock the required balance
    #[error("insufficient {asset} balance for {account}: required {required}")]
    InsufficientBalance {
        /// Account whose balance was checked
        account: Hash32,
        /// Asset that was short
        asset: Asset,
        /// Amount that had to be locked
        required: u128,
    },

    /// The alternative venue cannot supply the requested quantity
    #[error(
        "insufficient liquidity for {side} trade: requested {requested}, available {available}"
    )]
    InsufficientLiquidity {
        /// Direction of the trade
        side: Side,
        /// Quantity requested
        requested: u64,
        /// Quantity available
        available: u64,
    },

    /// A route plan was prepared against a different book state
    #[error("stale route plan: prepared at version {planned}, book is at {current}")]
    StalePlan {
        /// State version recorded in the plan
        planned: u64,
        /// Current state version of the book
        current: u64,
    },

    /// The alternative venue failed to quote or execute
    #[error("venue error: {message}")]
    Venue {
        /// Description of the failure
        message: String,
    },

    /// Configuration values are out of bounds
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the problem
        message: String,
    },

    /// Operation not permitted in the current state
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of the error
        message: String,
    },

    /// Error while serializing snapshot data
    #[error("serialization error: {message}")]
    SerializationError {
        /// Underlying error message
        message: String,
    },

    /// Error while deserializing snapshot data
    #[error("deserialization error: {message}")]
    DeserializationError {
        /// Underlying error message
        message: String,
    },

    /// Snapshot integrity check failed
    #[error("checksum mismatch: expected {expected}, but computed {actual}")]
    ChecksumMismatch {
        /// Expected checksum value
        expected: String,
        /// Actual checksum value
        actual: String,
    },
}
