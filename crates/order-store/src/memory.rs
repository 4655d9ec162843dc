use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use tokio::sync::RwLock;

use crate::{
    Result, StoreError, Version,
    store::{MutationFn, OrderStore, apply_mutation},
};

#[derive(Clone)]
struct StoredOrder {
    order: Order,
    version: Version,
}

/// In-memory order store.
///
/// Backs the unit and integration tests and provides the same optimistic
/// concurrency behavior as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, StoredOrder>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all stored orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, order_id: OrderId) -> Result<(Order, Version)> {
        let orders = self.orders.read().await;
        let stored = orders
            .get(&order_id)
            .ok_or(StoreError::NotFound(order_id))?;
        Ok((stored.order.clone(), stored.version))
    }

    async fn create(&self, order: Order) -> Result<(Order, Version)> {
        order.validate().map_err(StoreError::InvariantViolation)?;

        let mut orders = self.orders.write().await;
        let order_id = order.id();
        if orders.contains_key(&order_id) {
            return Err(StoreError::AlreadyExists(order_id));
        }

        let version = Version::initial();
        orders.insert(
            order_id,
            StoredOrder {
                order: order.clone(),
                version,
            },
        );
        Ok((order, version))
    }

    #[tracing::instrument(skip(self, mutation))]
    async fn commit(
        &self,
        order_id: OrderId,
        expected: Version,
        mutation: MutationFn,
    ) -> Result<(Order, Version)> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound(order_id))?;

        if stored.version != expected {
            metrics::counter!("order_store_commit_conflicts_total").increment(1);
            return Err(StoreError::VersionConflict {
                order_id,
                expected,
                actual: stored.version,
            });
        }

        let next = apply_mutation(&stored.order, mutation)?;
        stored.order = next.clone();
        stored.version = stored.version.next();

        metrics::counter!("order_store_commits_total").increment(1);
        Ok((next, stored.version))
    }

    async fn delete(&self, order_id: OrderId, expected: Version) -> Result<()> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get(&order_id)
            .ok_or(StoreError::NotFound(order_id))?;

        if stored.version != expected {
            return Err(StoreError::VersionConflict {
                order_id,
                expected,
                actual: stored.version,
            });
        }
        if stored.order.is_paid() {
            return Err(StoreError::Forbidden(order_id));
        }

        orders.remove(&order_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(Order, Version)>> {
        let orders = self.orders.read().await;
        let mut all: Vec<(Order, Version)> = orders
            .values()
            .map(|stored| (stored.order.clone(), stored.version))
            .collect();
        all.sort_by_key(|(order, _)| (order.created_at(), order.id().as_uuid()));
        Ok(all)
    }
}
