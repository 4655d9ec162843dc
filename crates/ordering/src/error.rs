use domain::{MenuItemId, OrderError, TableId};
use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur while handling order intents.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// The table is unknown or not currently available for a new order.
    #[error("table unavailable: {0}")]
    TableUnavailable(TableId),

    /// The menu item is unknown or flagged unavailable in the catalog.
    #[error("menu item unavailable: {0}")]
    MenuItemUnavailable(MenuItemId),

    /// The aggregate refused the change before it reached the store.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The store refused or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The menu catalog collaborator failed.
    #[error("menu catalog error: {0}")]
    Catalog(String),

    /// The table registry collaborator failed.
    #[error("table registry error: {0}")]
    Tables(String),
}

impl OrderingError {
    /// Returns true if the caller may re-read and retry the intent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderingError::Store(e) if e.is_retryable())
    }
}
