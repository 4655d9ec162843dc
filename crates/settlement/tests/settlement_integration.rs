//! Settlement against a live store: idempotence across clients, retry safety
//! after unknown outcomes, and invoice stability.

use chrono::Utc;
use common::OrderId;
use domain::{
    DiscountPercent, MenuItemId, Money, Order, OrderItem, OrderStatus, PaymentMethod, TableId,
};
use order_store::{InMemoryOrderStore, OrderStore, OrderStoreExt};
use settlement::{Invoice, PaymentCoordinator};

async fn open_order(store: &InMemoryOrderStore, discount: u8) -> OrderId {
    let order = Order::new(
        OrderId::new(),
        TableId::new(),
        8,
        DiscountPercent::new(discount).unwrap(),
        vec![
            OrderItem::new(MenuItemId::new(), "Papaya Salad", 1, Money::from_cents(950)),
            OrderItem::new(MenuItemId::new(), "Grilled Chicken", 2, Money::from_cents(1_600)),
        ],
        Utc::now(),
    )
    .unwrap();
    let order_id = order.id();
    store.create(order).await.unwrap();
    order_id
}

#[tokio::test]
async fn two_cashier_terminals_settle_exactly_once() {
    let store = InMemoryOrderStore::new();
    let order_id = open_order(&store, 0).await;

    // Two terminals, each with its own coordinator over the shared store.
    let terminal_a = PaymentCoordinator::new(store.clone());
    let terminal_b = PaymentCoordinator::new(store.clone());

    let a = terminal_a.mark_paid(order_id, PaymentMethod::Cash, None);
    let b = terminal_b.mark_paid(order_id, PaymentMethod::Cash, None);
    let (a, b) = tokio::join!(a, b);

    let a = a.unwrap();
    let b = b.unwrap();

    // Exactly one call performed the settlement; both hold the same invoice.
    assert_eq!(
        [a.newly_settled, b.newly_settled].iter().filter(|s| **s).count(),
        1
    );
    assert_eq!(a.invoice, b.invoice);
}

#[tokio::test]
async fn unknown_outcome_is_safe_to_redrive() {
    let store = InMemoryOrderStore::new();
    let order_id = open_order(&store, 10).await;
    let coordinator = PaymentCoordinator::new(store.clone());

    // A client sent mark_paid, the response timed out, and it cannot know
    // whether the commit landed. The safe move is simply to call again.
    let first = coordinator
        .mark_paid(order_id, PaymentMethod::Qr, None)
        .await
        .unwrap();
    let redriven = coordinator
        .mark_paid(order_id, PaymentMethod::Qr, None)
        .await
        .unwrap();

    assert_eq!(first.invoice, redriven.invoice);
    assert!(!redriven.newly_settled);
}

#[tokio::test]
async fn settlement_does_not_block_the_rest_of_the_lifecycle() {
    let store = InMemoryOrderStore::new();
    let order_id = open_order(&store, 0).await;
    let coordinator = PaymentCoordinator::new(store.clone());

    // Cashier pre-settles while the kitchen has not started yet.
    let settlement = coordinator
        .mark_paid(order_id, PaymentMethod::Card, None)
        .await
        .unwrap();
    assert!(settlement.newly_settled);

    // Kitchen keeps driving the order to completion afterwards.
    let (_, v) = store.get(order_id).await.unwrap();
    let (_, v) = store
        .commit_with(order_id, v, |o| o.transition(OrderStatus::Preparing))
        .await
        .unwrap();
    let (_, v) = store
        .commit_with(order_id, v, |o| o.transition(OrderStatus::Ready))
        .await
        .unwrap();
    let (_, v) = store
        .commit_with(order_id, v, |o| o.transition(OrderStatus::Served))
        .await
        .unwrap();
    let (completed, _) = store
        .commit_with(order_id, v, |o| o.transition(OrderStatus::Completed))
        .await
        .unwrap();
    assert_eq!(completed.status(), OrderStatus::Completed);

    // The invoice projected from the final snapshot is still the one the
    // cashier printed: settlement froze the money.
    let reprojected = Invoice::project(&completed).unwrap();
    assert_eq!(reprojected, settlement.invoice);
}

#[tokio::test]
async fn settled_orders_survive_deletion_attempts() {
    let store = InMemoryOrderStore::new();
    let order_id = open_order(&store, 0).await;
    let coordinator = PaymentCoordinator::new(store.clone());

    coordinator
        .mark_paid(order_id, PaymentMethod::Cash, None)
        .await
        .unwrap();

    let (_, version) = store.get(order_id).await.unwrap();
    let result = store.delete(order_id, version).await;
    assert!(matches!(
        result,
        Err(order_store::StoreError::Forbidden(_))
    ));
}
