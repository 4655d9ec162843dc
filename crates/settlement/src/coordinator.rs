//! The payment coordinator.

use chrono::Utc;
use common::OrderId;
use domain::{DiscountPercent, OrderStatus, PaymentMethod};
use order_store::{OrderStore, OrderStoreExt};

use crate::error::SettlementError;
use crate::invoice::Invoice;

/// How many read-compute-commit cycles a single `mark_paid` call will run
/// before surfacing the conflict. Bounded on purpose: endless retries would
/// hide contention instead of reporting it.
const COMMIT_ATTEMPTS: u32 = 2;

/// The outcome of a `mark_paid` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub invoice: Invoice,
    /// False when the order was already paid and the existing invoice was
    /// returned unchanged (the duplicate-click case).
    pub newly_settled: bool,
}

/// Orchestrates settlement: state validation, discount resolution, the
/// versioned commit, and invoice projection.
pub struct PaymentCoordinator<S> {
    store: S,
}

impl<S: OrderStore> PaymentCoordinator<S> {
    /// Creates a new coordinator over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Marks an order paid and returns its invoice.
    ///
    /// Idempotent: if the order is already paid, the existing invoice is
    /// re-projected from the stored snapshot and returned with
    /// `newly_settled = false`; nothing is committed a second time. The
    /// `is_paid` flag inside the versioned commit is the linearization
    /// point, so two racing cashiers produce exactly one settlement.
    ///
    /// A supplied `discount_override` replaces the order's stored discount
    /// for the final bill; the resolved value is committed onto the order so
    /// the invoice derivation stays self-contained.
    #[tracing::instrument(skip(self))]
    pub async fn mark_paid(
        &self,
        order_id: OrderId,
        payment_method: PaymentMethod,
        discount_override: Option<DiscountPercent>,
    ) -> Result<Settlement, SettlementError> {
        metrics::counter!("settlements_total").increment(1);
        let started = std::time::Instant::now();

        for attempt in 0..COMMIT_ATTEMPTS {
            let (order, version) = self.store.get(order_id).await?;

            if order.is_paid() {
                tracing::info!(%order_id, "order already paid, returning existing invoice");
                return Ok(Settlement {
                    invoice: Invoice::project(&order)?,
                    newly_settled: false,
                });
            }
            if order.status() == OrderStatus::Cancelled {
                return Err(SettlementError::InvalidState {
                    order_id,
                    status: order.status(),
                });
            }

            let resolved = discount_override.unwrap_or(order.discount_percent());
            let paid_at = Utc::now();

            match self
                .store
                .commit_with(order_id, version, move |order| {
                    order.settle(payment_method, resolved, paid_at)
                })
                .await
            {
                Ok((committed, _)) => {
                    metrics::histogram!("settlement_duration_seconds")
                        .record(started.elapsed().as_secs_f64());
                    tracing::info!(
                        %order_id,
                        method = %payment_method,
                        discount = %resolved,
                        "order settled"
                    );
                    return Ok(Settlement {
                        invoice: Invoice::project(&committed)?,
                        newly_settled: true,
                    });
                }
                Err(err) if err.is_retryable() && attempt + 1 < COMMIT_ATTEMPTS => {
                    metrics::counter!("settlement_conflicts_total").increment(1);
                    tracing::warn!(%order_id, attempt, "settlement commit conflicted, rereading");
                    continue;
                }
                Err(err) if err.is_retryable() => {
                    metrics::counter!("settlement_conflicts_total").increment(1);
                    return Err(SettlementError::Conflict(order_id));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(SettlementError::Conflict(order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{DiscountPercent, MenuItemId, Money, Order, OrderItem, TableId};
    use order_store::{InMemoryOrderStore, OrderStore};

    async fn seeded_store() -> (InMemoryOrderStore, OrderId) {
        let store = InMemoryOrderStore::new();
        let order = Order::new(
            OrderId::new(),
            TableId::new(),
            6,
            DiscountPercent::new(10).unwrap(),
            vec![OrderItem::new(
                MenuItemId::new(),
                "Mango Sticky Rice",
                2,
                Money::from_cents(10_000),
            )],
            Utc::now(),
        )
        .unwrap();
        let order_id = order.id();
        store.create(order).await.unwrap();
        (store, order_id)
    }

    #[tokio::test]
    async fn mark_paid_settles_and_projects_the_invoice() {
        let (store, order_id) = seeded_store().await;
        let coordinator = PaymentCoordinator::new(store.clone());

        let settlement = coordinator
            .mark_paid(order_id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        assert!(settlement.newly_settled);
        assert_eq!(settlement.invoice.subtotal.cents(), 20_000);
        assert_eq!(settlement.invoice.discount_amount.cents(), 2_000);
        assert_eq!(settlement.invoice.total.cents(), 18_000);

        let (stored, _) = store.get(order_id).await.unwrap();
        assert!(stored.is_paid());
        assert_eq!(stored.payment_method(), Some(PaymentMethod::Cash));
    }

    #[tokio::test]
    async fn duplicate_mark_paid_returns_the_identical_invoice() {
        let (store, order_id) = seeded_store().await;
        let coordinator = PaymentCoordinator::new(store.clone());

        let first = coordinator
            .mark_paid(order_id, PaymentMethod::Cash, None)
            .await
            .unwrap();
        let (_, version_after_first) = store.get(order_id).await.unwrap();

        let second = coordinator
            .mark_paid(order_id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        assert!(first.newly_settled);
        assert!(!second.newly_settled);
        assert_eq!(first.invoice, second.invoice);

        // No second state change happened.
        let (_, version_after_second) = store.get(order_id).await.unwrap();
        assert_eq!(version_after_first, version_after_second);
    }

    #[tokio::test]
    async fn duplicate_call_ignores_a_different_override() {
        let (store, order_id) = seeded_store().await;
        let coordinator = PaymentCoordinator::new(store);

        let first = coordinator
            .mark_paid(order_id, PaymentMethod::Cash, None)
            .await
            .unwrap();
        // The order is settled; a late click with another discount changes nothing.
        let second = coordinator
            .mark_paid(
                order_id,
                PaymentMethod::Card,
                Some(DiscountPercent::new(50).unwrap()),
            )
            .await
            .unwrap();

        assert_eq!(first.invoice, second.invoice);
        assert_eq!(second.invoice.payment_method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn override_replaces_the_stored_discount() {
        let (store, order_id) = seeded_store().await;
        let coordinator = PaymentCoordinator::new(store);

        // Stored discount is 10%; the override is 25%, not 10% + 25%.
        let settlement = coordinator
            .mark_paid(
                order_id,
                PaymentMethod::Qr,
                Some(DiscountPercent::new(25).unwrap()),
            )
            .await
            .unwrap();

        assert_eq!(settlement.invoice.discount_percent.as_u8(), 25);
        assert_eq!(settlement.invoice.discount_amount.cents(), 5_000);
        assert_eq!(settlement.invoice.total.cents(), 15_000);
    }

    #[tokio::test]
    async fn cancelled_orders_cannot_be_paid() {
        let (store, order_id) = seeded_store().await;
        {
            use order_store::OrderStoreExt;
            let (_, v) = store.get(order_id).await.unwrap();
            store
                .commit_with(order_id, v, |o| o.transition(OrderStatus::Cancelled))
                .await
                .unwrap();
        }
        let coordinator = PaymentCoordinator::new(store);

        let result = coordinator
            .mark_paid(order_id, PaymentMethod::Cash, None)
            .await;
        assert!(matches!(
            result,
            Err(SettlementError::InvalidState {
                status: OrderStatus::Cancelled,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unknown_order_fails_not_found() {
        let coordinator = PaymentCoordinator::new(InMemoryOrderStore::new());
        let result = coordinator
            .mark_paid(OrderId::new(), PaymentMethod::Cash, None)
            .await;
        assert!(matches!(result, Err(SettlementError::NotFound(_))));
    }

    /// Store wrapper that fails the next N commits with a version conflict,
    /// as if another client kept winning the race.
    #[derive(Clone)]
    struct ContendedStore {
        inner: InMemoryOrderStore,
        forced_conflicts: std::sync::Arc<std::sync::atomic::AtomicU32>,
    }

    impl ContendedStore {
        fn new(inner: InMemoryOrderStore, conflicts: u32) -> Self {
            Self {
                inner,
                forced_conflicts: std::sync::Arc::new(std::sync::atomic::AtomicU32::new(
                    conflicts,
                )),
            }
        }
    }

    #[async_trait::async_trait]
    impl OrderStore for ContendedStore {
        async fn get(&self, order_id: OrderId) -> order_store::Result<(Order, order_store::Version)> {
            self.inner.get(order_id).await
        }

        async fn create(&self, order: Order) -> order_store::Result<(Order, order_store::Version)> {
            self.inner.create(order).await
        }

        async fn commit(
            &self,
            order_id: OrderId,
            expected: order_store::Version,
            mutation: order_store::MutationFn,
        ) -> order_store::Result<(Order, order_store::Version)> {
            use std::sync::atomic::Ordering;
            let left = self.forced_conflicts.load(Ordering::SeqCst);
            if left > 0 {
                self.forced_conflicts.store(left - 1, Ordering::SeqCst);
                return Err(order_store::StoreError::VersionConflict {
                    order_id,
                    expected,
                    actual: expected.next(),
                });
            }
            self.inner.commit(order_id, expected, mutation).await
        }

        async fn delete(
            &self,
            order_id: OrderId,
            expected: order_store::Version,
        ) -> order_store::Result<()> {
            self.inner.delete(order_id, expected).await
        }

        async fn list(&self) -> order_store::Result<Vec<(Order, order_store::Version)>> {
            self.inner.list().await
        }
    }

    #[tokio::test]
    async fn a_single_conflict_is_absorbed_by_the_retry() {
        let (store, order_id) = seeded_store().await;
        let coordinator = PaymentCoordinator::new(ContendedStore::new(store.clone(), 1));

        let settlement = coordinator
            .mark_paid(order_id, PaymentMethod::Card, None)
            .await
            .unwrap();
        assert!(settlement.newly_settled);

        let (stored, _) = store.get(order_id).await.unwrap();
        assert!(stored.is_paid());
    }

    #[tokio::test]
    async fn persistent_conflicts_surface_after_the_bounded_retry() {
        let (store, order_id) = seeded_store().await;
        let coordinator = PaymentCoordinator::new(ContendedStore::new(store.clone(), u32::MAX));

        let result = coordinator
            .mark_paid(order_id, PaymentMethod::Card, None)
            .await;
        assert!(matches!(result, Err(SettlementError::Conflict(id)) if id == order_id));

        // Nothing was committed.
        let (stored, _) = store.get(order_id).await.unwrap();
        assert!(!stored.is_paid());
    }
}
