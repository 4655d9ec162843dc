//! The order intent service.

use chrono::Utc;
use common::OrderId;
use domain::{
    DiscountPercent, ItemStatus, MenuItemId, Order, OrderItem, OrderItemId, OrderStatus, TableId,
};
use order_store::{OrderStore, OrderStoreExt, Version};
use serde::Deserialize;

use crate::error::OrderingError;
use crate::services::catalog::MenuCatalog;
use crate::services::tables::{TableRegistry, TableStatus};

/// A requested line before the catalog snapshot is taken.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
}

/// Entry point for every order mutation short of settlement.
///
/// Every write goes through the store's versioned commit; when a commit
/// conflicts, the error is surfaced so the client can re-fetch and decide;
/// the service never retries on the caller's behalf, because the caller's
/// intent was formed against the version it read.
pub struct OrderService<S, C, T> {
    store: S,
    catalog: C,
    tables: T,
}

impl<S, C, T> OrderService<S, C, T>
where
    S: OrderStore,
    C: MenuCatalog,
    T: TableRegistry,
{
    /// Creates a new order service.
    pub fn new(store: S, catalog: C, tables: T) -> Self {
        Self {
            store,
            catalog,
            tables,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens a new order on a table.
    ///
    /// The table must be reported available by the registry, and every
    /// requested line must resolve to an available catalog item. Prices and
    /// names are snapshotted here; this is the only place the catalog is
    /// consulted for money.
    #[tracing::instrument(skip(self, items))]
    pub async fn create_order(
        &self,
        table_id: TableId,
        items: Vec<NewOrderItem>,
        discount_percent: DiscountPercent,
    ) -> Result<(Order, Version), OrderingError> {
        let table = self
            .tables
            .lookup(table_id)
            .await?
            .filter(|t| t.status == TableStatus::Available)
            .ok_or(OrderingError::TableUnavailable(table_id))?;

        let lines = self.snapshot_items(items).await?;
        let order = Order::new(
            OrderId::new(),
            table_id,
            table.table_number,
            discount_percent,
            lines,
            Utc::now(),
        )?;

        let created = self.store.create(order).await?;
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %created.0.id(), table = table.table_number, "order created");
        Ok(created)
    }

    /// Appends lines to an open order.
    #[tracing::instrument(skip(self, items))]
    pub async fn add_items(
        &self,
        order_id: OrderId,
        expected_version: Version,
        items: Vec<NewOrderItem>,
    ) -> Result<(Order, Version), OrderingError> {
        let lines = self.snapshot_items(items).await?;
        let committed = self
            .store
            .commit_with(order_id, expected_version, move |order| {
                order.add_items(lines)
            })
            .await?;
        Ok(committed)
    }

    /// Moves an order to a new status.
    #[tracing::instrument(skip(self))]
    pub async fn transition_order(
        &self,
        order_id: OrderId,
        expected_version: Version,
        status: OrderStatus,
    ) -> Result<(Order, Version), OrderingError> {
        let committed = self
            .store
            .commit_with(order_id, expected_version, move |order| {
                order.transition(status)
            })
            .await?;
        Ok(committed)
    }

    /// Moves a single line to a new status.
    #[tracing::instrument(skip(self))]
    pub async fn transition_item(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
        expected_version: Version,
        status: ItemStatus,
    ) -> Result<(Order, Version), OrderingError> {
        let committed = self
            .store
            .commit_with(order_id, expected_version, move |order| {
                order.transition_item(item_id, status)
            })
            .await?;
        Ok(committed)
    }

    /// Hard-removes an unpaid order.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(
        &self,
        order_id: OrderId,
        expected_version: Version,
    ) -> Result<(), OrderingError> {
        self.store.delete(order_id, expected_version).await?;
        tracing::info!(%order_id, "order deleted");
        Ok(())
    }

    /// Loads an order with its version token.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<(Order, Version), OrderingError> {
        Ok(self.store.get(order_id).await?)
    }

    /// Lists all orders, oldest first, for polling clients.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<(Order, Version)>, OrderingError> {
        Ok(self.store.list().await?)
    }

    /// Resolves requested lines against the catalog, snapshotting price and
    /// name. Unknown or unavailable items fail the whole intent.
    async fn snapshot_items(
        &self,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItem>, OrderingError> {
        let mut lines = Vec::with_capacity(items.len());
        for requested in items {
            let info = self
                .catalog
                .lookup(requested.menu_item_id)
                .await?
                .filter(|i| i.is_available)
                .ok_or(OrderingError::MenuItemUnavailable(requested.menu_item_id))?;
            lines.push(OrderItem::new(
                info.menu_item_id,
                info.name,
                requested.quantity,
                info.price,
            ));
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::InMemoryMenuCatalog;
    use crate::services::tables::InMemoryTableRegistry;
    use domain::{Money, OrderError};
    use order_store::{InMemoryOrderStore, StoreError};

    struct Fixture {
        service: OrderService<InMemoryOrderStore, InMemoryMenuCatalog, InMemoryTableRegistry>,
        catalog: InMemoryMenuCatalog,
        tables: InMemoryTableRegistry,
        table_id: TableId,
        noodles: MenuItemId,
        tea: MenuItemId,
    }

    fn fixture() -> Fixture {
        let store = InMemoryOrderStore::new();
        let catalog = InMemoryMenuCatalog::new();
        let tables = InMemoryTableRegistry::new();

        let table_id = tables.add_table(9, 4);
        let noodles = catalog.add_item("Drunken Noodles", Money::from_cents(1_100));
        let tea = catalog.add_item("Thai Iced Tea", Money::from_cents(450));

        let service = OrderService::new(store, catalog.clone(), tables.clone());
        Fixture {
            service,
            catalog,
            tables,
            table_id,
            noodles,
            tea,
        }
    }

    fn want(menu_item_id: MenuItemId, quantity: u32) -> NewOrderItem {
        NewOrderItem {
            menu_item_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn create_order_snapshots_prices_and_names() {
        let f = fixture();
        let (order, version) = f
            .service
            .create_order(
                f.table_id,
                vec![want(f.noodles, 2), want(f.tea, 1)],
                DiscountPercent::ZERO,
            )
            .await
            .unwrap();

        assert_eq!(version, Version::initial());
        assert_eq!(order.table_number(), 9);
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.items()[0].name, "Drunken Noodles");
        assert_eq!(order.items()[0].unit_price.cents(), 1_100);
        assert_eq!(order.totals().subtotal.cents(), 2_650);
    }

    #[tokio::test]
    async fn catalog_price_changes_do_not_touch_existing_orders() {
        let f = fixture();
        let (order, _) = f
            .service
            .create_order(f.table_id, vec![want(f.noodles, 1)], DiscountPercent::ZERO)
            .await
            .unwrap();

        f.catalog.set_price(f.noodles, Money::from_cents(9_999));

        let (reloaded, _) = f.service.get_order(order.id()).await.unwrap();
        assert_eq!(reloaded.items()[0].unit_price.cents(), 1_100);
    }

    #[tokio::test]
    async fn create_order_fails_on_occupied_table() {
        let f = fixture();
        f.tables.set_status(f.table_id, TableStatus::Occupied);

        let result = f
            .service
            .create_order(f.table_id, vec![want(f.tea, 1)], DiscountPercent::ZERO)
            .await;
        assert!(matches!(result, Err(OrderingError::TableUnavailable(_))));
    }

    #[tokio::test]
    async fn create_order_fails_on_unavailable_menu_item() {
        let f = fixture();
        f.catalog.set_available(f.noodles, false);

        let result = f
            .service
            .create_order(f.table_id, vec![want(f.noodles, 1)], DiscountPercent::ZERO)
            .await;
        assert!(matches!(
            result,
            Err(OrderingError::MenuItemUnavailable(id)) if id == f.noodles
        ));
    }

    #[tokio::test]
    async fn add_items_requires_the_current_version() {
        let f = fixture();
        let (order, v0) = f
            .service
            .create_order(f.table_id, vec![want(f.tea, 1)], DiscountPercent::ZERO)
            .await
            .unwrap();

        let (_, v1) = f
            .service
            .add_items(order.id(), v0, vec![want(f.noodles, 1)])
            .await
            .unwrap();

        // A second client still holding v0 loses.
        let result = f
            .service
            .add_items(order.id(), v0, vec![want(f.tea, 2)])
            .await;
        assert!(matches!(
            result,
            Err(OrderingError::Store(StoreError::VersionConflict { .. }))
        ));

        // Retrying against the fresh token succeeds.
        let (reloaded, _) = f
            .service
            .add_items(order.id(), v1, vec![want(f.tea, 2)])
            .await
            .unwrap();
        assert_eq!(reloaded.items().len(), 3);
    }

    #[tokio::test]
    async fn transitions_flow_through_the_state_machine() {
        let f = fixture();
        let (order, v0) = f
            .service
            .create_order(f.table_id, vec![want(f.noodles, 1)], DiscountPercent::ZERO)
            .await
            .unwrap();

        let (order2, v1) = f
            .service
            .transition_order(order.id(), v0, OrderStatus::Preparing)
            .await
            .unwrap();
        assert_eq!(order2.status(), OrderStatus::Preparing);

        let result = f
            .service
            .transition_order(order.id(), v1, OrderStatus::Completed)
            .await;
        assert!(matches!(
            result,
            Err(OrderingError::Store(StoreError::Rejected(
                OrderError::InvalidTransition { .. }
            )))
        ));
    }

    #[tokio::test]
    async fn item_transition_targets_one_line() {
        let f = fixture();
        let (order, v0) = f
            .service
            .create_order(
                f.table_id,
                vec![want(f.noodles, 1), want(f.tea, 1)],
                DiscountPercent::ZERO,
            )
            .await
            .unwrap();
        let first = order.items()[0].id;

        let (updated, _) = f
            .service
            .transition_item(order.id(), first, v0, ItemStatus::Preparing)
            .await
            .unwrap();

        assert_eq!(updated.items()[0].status, ItemStatus::Preparing);
        assert_eq!(updated.items()[1].status, ItemStatus::Pending);
    }

    #[tokio::test]
    async fn delete_order_is_a_hard_remove() {
        let f = fixture();
        let (order, v0) = f
            .service
            .create_order(f.table_id, vec![want(f.tea, 1)], DiscountPercent::ZERO)
            .await
            .unwrap();

        f.service.delete_order(order.id(), v0).await.unwrap();
        let result = f.service.get_order(order.id()).await;
        assert!(matches!(
            result,
            Err(OrderingError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn list_orders_feeds_polling_clients() {
        let f = fixture();
        f.service
            .create_order(f.table_id, vec![want(f.tea, 1)], DiscountPercent::ZERO)
            .await
            .unwrap();
        f.service
            .create_order(f.table_id, vec![want(f.noodles, 2)], DiscountPercent::ZERO)
            .await
            .unwrap();

        let all = f.service.list_orders().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
