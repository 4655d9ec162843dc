//! Domain error types.

use thiserror::Error;

use crate::order::OrderItemId;
use crate::status::{ItemStatus, OrderStatus};

/// Errors produced by the order aggregate and its state machine.
///
/// None of these are transient: every variant signals a caller bug or a
/// stale client view, and must not be retried automatically.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Requested order status is not reachable from the current one.
    #[error("invalid order transition: {current} -> {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    /// Requested item status is not reachable from the current one.
    #[error("invalid item transition: {current} -> {requested}")]
    InvalidItemTransition {
        current: ItemStatus,
        requested: ItemStatus,
    },

    /// Order no longer accepts the change (paid, completed, or cancelled).
    #[error("order is closed (status: {status}, paid: {is_paid})")]
    OrderClosed { status: OrderStatus, is_paid: bool },

    /// No line with this id exists on the order.
    #[error("item not found in order: {item_id}")]
    ItemNotFound { item_id: OrderItemId },

    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    #[error("invalid unit price: {cents} cents (must not be negative)")]
    InvalidPrice { cents: i64 },

    #[error("discount out of range: {value} (must be between 0 and 100)")]
    InvalidDiscount { value: u8 },

    #[error("order has no items")]
    NoItems,

    #[error("order is already paid")]
    AlreadyPaid,

    /// Settlement requested for an order in a status that cannot be paid.
    #[error("cannot settle an order in {status} status")]
    NotPayable { status: OrderStatus },

    /// A paid order is missing its payment method or settlement time.
    #[error("a paid order must carry a payment method and settlement time")]
    MissingPaymentDetails,

    /// A mutation tried to rewrite immutable identity fields.
    #[error("order identity fields cannot change")]
    IdentityChanged,

    /// A mutation tried to flip `is_paid` back to false.
    #[error("a committed payment cannot be reverted")]
    PaymentReverted,

    /// A mutation tried to remove lines from the order.
    #[error("order items cannot be removed")]
    ItemsRemoved,

    /// A mutation changed a line's snapshot fields instead of its status.
    #[error("order item {item_id} may only change status")]
    ItemMutated { item_id: OrderItemId },

    /// A mutation changed monetary fields of an already-settled order.
    #[error("monetary fields of a settled order cannot change")]
    SettledOrderModified,
}
