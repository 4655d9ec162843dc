//! HTTP API server for the order lifecycle and billing engine.
//!
//! Exposes the order intents and settlement over REST, with structured
//! logging (tracing) and Prometheus metrics. Transport concerns end here;
//! all rules live in the `domain`, `order-store`, `ordering`, and
//! `settlement` crates.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use ordering::{InMemoryMenuCatalog, InMemoryTableRegistry, OrderService};
use settlement::PaymentCoordinator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}", delete(routes::orders::delete::<S>))
        .route("/orders/{id}/status", post(routes::orders::transition::<S>))
        .route("/orders/{id}/items", post(routes::orders::add_items::<S>))
        .route(
            "/orders/{id}/items/{item_id}/status",
            post(routes::orders::transition_item::<S>),
        )
        .route("/orders/{id}/pay", post(routes::orders::pay::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the given store, with
/// in-memory catalog and table collaborators.
///
/// The collaborator handles stay reachable through the state so embedding
/// processes (and tests) can seed menu items and tables.
pub fn create_default_state<S: OrderStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    let catalog = InMemoryMenuCatalog::new();
    let tables = InMemoryTableRegistry::new();

    let orders = OrderService::new(store.clone(), catalog.clone(), tables.clone());
    let payments = PaymentCoordinator::new(store);

    Arc::new(AppState {
        orders,
        payments,
        catalog,
        tables,
    })
}
