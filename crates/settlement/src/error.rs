use common::OrderId;
use domain::OrderStatus;
use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur during settlement.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// No order exists under this id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The order's status does not permit payment.
    #[error("cannot settle order {order_id} in {status} status")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Concurrent commits kept winning; the bounded retry gave up.
    /// The caller should re-fetch and decide whether to try again.
    #[error("settlement of order {0} conflicted with concurrent updates")]
    Conflict(OrderId),

    /// Invoice projection was asked for an order that is not paid.
    #[error("order {0} is not settled; no invoice can be projected")]
    NotSettled(OrderId),

    /// The store refused or failed the commit.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SettlementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(order_id) => SettlementError::NotFound(order_id),
            other => SettlementError::Store(other),
        }
    }
}
