use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderError, validate_mutation};

use crate::{Result, StoreError, Version};

/// A mutation applied to a copy of the stored aggregate inside a commit.
pub type MutationFn = Box<dyn FnOnce(&mut Order) -> std::result::Result<(), OrderError> + Send>;

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync) and must enforce
/// optimistic concurrency: a commit only applies when the caller presents the
/// version it read.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Loads an order and its current version token.
    async fn get(&self, order_id: OrderId) -> Result<(Order, Version)>;

    /// Persists a new order at version 0.
    ///
    /// The aggregate is validated before it is stored; an existing order
    /// under the same id fails with `AlreadyExists`.
    async fn create(&self, order: Order) -> Result<(Order, Version)>;

    /// Applies `mutation` to a copy of the stored aggregate and persists the
    /// result under the next version.
    ///
    /// Fails with `VersionConflict` when `expected` is stale (retryable),
    /// with `Rejected` when the mutation itself refuses the change, and with
    /// `InvariantViolation` when the mutated aggregate breaks the entity
    /// rules (both non-retryable). On any failure nothing is persisted.
    async fn commit(
        &self,
        order_id: OrderId,
        expected: Version,
        mutation: MutationFn,
    ) -> Result<(Order, Version)>;

    /// Hard-removes an order. Only permitted before payment.
    async fn delete(&self, order_id: OrderId, expected: Version) -> Result<()>;

    /// Lists all orders with their version tokens, oldest first.
    async fn list(&self) -> Result<Vec<(Order, Version)>>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Commits an unboxed closure; sugar over [`OrderStore::commit`].
    async fn commit_with<F>(
        &self,
        order_id: OrderId,
        expected: Version,
        mutation: F,
    ) -> Result<(Order, Version)>
    where
        F: FnOnce(&mut Order) -> std::result::Result<(), OrderError> + Send + 'static,
    {
        self.commit(order_id, expected, Box::new(mutation)).await
    }

    /// Checks whether an order exists.
    async fn exists(&self, order_id: OrderId) -> Result<bool> {
        match self.get(order_id).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}

/// Runs a mutation against a copy of `current` and re-checks every rule.
///
/// Shared by all backends so the invariants cannot diverge between them:
/// the mutation's own result maps to `Rejected`, and the cross-commit guard
/// plus entity validation map to `InvariantViolation`.
pub(crate) fn apply_mutation(current: &Order, mutation: MutationFn) -> Result<Order> {
    let mut next = current.clone();
    mutation(&mut next).map_err(StoreError::Rejected)?;
    validate_mutation(current, &next).map_err(StoreError::InvariantViolation)?;
    next.validate().map_err(StoreError::InvariantViolation)?;
    Ok(next)
}
