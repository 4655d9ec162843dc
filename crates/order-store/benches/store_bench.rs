use chrono::Utc;
use common::OrderId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{DiscountPercent, MenuItemId, Money, Order, OrderItem, OrderStatus, TableId};
use order_store::{InMemoryOrderStore, OrderStore, OrderStoreExt};

fn bench_order() -> Order {
    Order::new(
        OrderId::new(),
        TableId::new(),
        1,
        DiscountPercent::ZERO,
        vec![OrderItem::new(
            MenuItemId::new(),
            "Bench Bowl",
            2,
            Money::from_cents(1_000),
        )],
        Utc::now(),
    )
    .unwrap()
}

fn bench_create(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("order_store/create", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryOrderStore::new();
                store.create(bench_order()).await.unwrap();
            });
        });
    });
}

fn bench_commit_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("order_store/read_commit_cycle", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryOrderStore::new();
                let order = bench_order();
                let order_id = order.id();
                let (_, v0) = store.create(order).await.unwrap();

                let (_, version) = store.get(order_id).await.unwrap();
                assert_eq!(version, v0);
                store
                    .commit_with(order_id, version, |o| o.transition(OrderStatus::Preparing))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_create, bench_commit_cycle);
criterion_main!(benches);
