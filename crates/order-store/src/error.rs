use common::OrderId;
use domain::OrderError;
use thiserror::Error;

use crate::Version;

/// Errors produced by order store operations.
///
/// The taxonomy separates what callers should do next: `VersionConflict` is
/// the only retryable variant (re-read, re-validate, re-attempt, bounded);
/// `Rejected` and `InvariantViolation` mean the change itself is illegal and
/// must be surfaced, never retried; `Database`/`Serialization` are
/// environment failures with unknown outcome, so callers must re-read before
/// deciding anything.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order exists under this id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// An order already exists under this id.
    #[error("order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The presented version token is stale; someone else committed first.
    #[error("version conflict for order {order_id}: expected {expected}, found {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// The mutation itself refused the change (stale client or caller bug).
    #[error("mutation rejected: {0}")]
    Rejected(#[from] OrderError),

    /// The mutated aggregate failed re-validation against the entity rules.
    #[error("invariant violation: {0}")]
    InvariantViolation(OrderError),

    /// Deletion refused: paid orders are permanent.
    #[error("cannot delete order {0}: it has been paid")]
    Forbidden(OrderId),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if the caller may re-read and retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
