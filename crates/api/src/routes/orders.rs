//! Order intent and settlement endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{
    DiscountPercent, ItemStatus, MenuItemId, Order, OrderItemId, OrderStatus, PaymentMethod,
    TableId,
};
use order_store::{OrderStore, Version};
use ordering::{InMemoryMenuCatalog, InMemoryTableRegistry, NewOrderItem, OrderService};
use serde::{Deserialize, Serialize};
use settlement::PaymentCoordinator;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub orders: OrderService<S, InMemoryMenuCatalog, InMemoryTableRegistry>,
    pub payments: PaymentCoordinator<S>,
    pub catalog: InMemoryMenuCatalog,
    pub tables: InMemoryTableRegistry,
}

// -- Request types --

#[derive(Deserialize)]
pub struct ItemRequest {
    pub menu_item_id: uuid::Uuid,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub table_id: uuid::Uuid,
    #[serde(default)]
    pub discount_percent: DiscountPercent,
    pub items: Vec<ItemRequest>,
}

#[derive(Deserialize)]
pub struct AddItemsRequest {
    pub expected_version: i64,
    pub items: Vec<ItemRequest>,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub expected_version: i64,
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct ItemTransitionRequest {
    pub expected_version: i64,
    pub status: ItemStatus,
}

#[derive(Deserialize)]
pub struct PayRequest {
    pub payment_method: PaymentMethod,
    pub discount_percent: Option<DiscountPercent>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub expected_version: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub menu_item_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub status: ItemStatus,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub table_id: String,
    pub table_number: u32,
    pub status: OrderStatus,
    pub discount_percent: u8,
    pub is_paid: bool,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub items: Vec<OrderItemResponse>,
    pub subtotal_cents: i64,
    pub discount_amount_cents: i64,
    pub total_cents: i64,
}

impl OrderResponse {
    fn from_parts(order: &Order, version: Version) -> Self {
        let totals = order.totals();
        let items = order
            .items()
            .iter()
            .map(|item| OrderItemResponse {
                id: item.id.to_string(),
                menu_item_id: item.menu_item_id.to_string(),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
                status: item.status,
            })
            .collect();

        Self {
            id: order.id().to_string(),
            table_id: order.table_id().to_string(),
            table_number: order.table_number(),
            status: order.status(),
            discount_percent: order.discount_percent().as_u8(),
            is_paid: order.is_paid(),
            payment_method: order.payment_method(),
            created_at: order.created_at(),
            paid_at: order.paid_at(),
            version: version.as_i64(),
            items,
            subtotal_cents: totals.subtotal.cents(),
            discount_amount_cents: totals.discount_amount.cents(),
            total_cents: totals.total.cents(),
        }
    }
}

#[derive(Serialize)]
pub struct InvoiceLineResponse {
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Serialize)]
pub struct InvoiceResponse {
    pub invoice_number: String,
    pub order_id: String,
    pub table_number: u32,
    pub lines: Vec<InvoiceLineResponse>,
    pub subtotal_cents: i64,
    pub discount_percent: u8,
    pub discount_amount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub settled_at: DateTime<Utc>,
    /// False when this call found the order already settled.
    pub newly_settled: bool,
}

impl InvoiceResponse {
    fn from_settlement(settlement: settlement::Settlement) -> Self {
        let invoice = settlement.invoice;
        Self {
            invoice_number: invoice.invoice_number,
            order_id: invoice.order_id.to_string(),
            table_number: invoice.table_number,
            lines: invoice
                .lines
                .into_iter()
                .map(|line| InvoiceLineResponse {
                    name: line.name,
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                    subtotal_cents: line.subtotal.cents(),
                })
                .collect(),
            subtotal_cents: invoice.subtotal.cents(),
            discount_percent: invoice.discount_percent.as_u8(),
            discount_amount_cents: invoice.discount_amount.cents(),
            total_cents: invoice.total.cents(),
            payment_method: invoice.payment_method,
            settled_at: invoice.settled_at,
            newly_settled: settlement.newly_settled,
        }
    }
}

// -- Handlers --

fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn parse_item_id(raw: &str) -> Result<OrderItemId, ApiError> {
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("invalid item id: {e}")))?;
    Ok(OrderItemId::from_uuid(uuid))
}

fn to_new_items(items: Vec<ItemRequest>) -> Vec<NewOrderItem> {
    items
        .into_iter()
        .map(|item| NewOrderItem {
            menu_item_id: MenuItemId::from_uuid(item.menu_item_id),
            quantity: item.quantity,
        })
        .collect()
}

/// POST /orders — open a new order on a table.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let (order, version) = state
        .orders
        .create_order(
            TableId::from_uuid(req.table_id),
            to_new_items(req.items),
            req.discount_percent,
        )
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(OrderResponse::from_parts(&order, version)),
    ))
}

/// GET /orders — list all orders for polling clients.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders().await?;
    let responses = orders
        .iter()
        .map(|(order, version)| OrderResponse::from_parts(order, *version))
        .collect();
    Ok(Json(responses))
}

/// GET /orders/{id} — load one order with its version token.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let (order, version) = state.orders.get_order(order_id).await?;
    Ok(Json(OrderResponse::from_parts(&order, version)))
}

/// POST /orders/{id}/status — transition the order.
#[tracing::instrument(skip(state, req))]
pub async fn transition<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let (order, version) = state
        .orders
        .transition_order(order_id, Version::new(req.expected_version), req.status)
        .await?;
    Ok(Json(OrderResponse::from_parts(&order, version)))
}

/// POST /orders/{id}/items — append lines to an open order.
#[tracing::instrument(skip(state, req))]
pub async fn add_items<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AddItemsRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let (order, version) = state
        .orders
        .add_items(
            order_id,
            Version::new(req.expected_version),
            to_new_items(req.items),
        )
        .await?;
    Ok(Json(OrderResponse::from_parts(&order, version)))
}

/// POST /orders/{id}/items/{item_id}/status — transition one line.
#[tracing::instrument(skip(state, req))]
pub async fn transition_item<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<ItemTransitionRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let item_id = parse_item_id(&item_id)?;
    let (order, version) = state
        .orders
        .transition_item(
            order_id,
            item_id,
            Version::new(req.expected_version),
            req.status,
        )
        .await?;
    Ok(Json(OrderResponse::from_parts(&order, version)))
}

/// POST /orders/{id}/pay — settle the order and return its invoice.
///
/// Duplicate calls return the same invoice with `newly_settled = false`.
#[tracing::instrument(skip(state, req))]
pub async fn pay<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<PayRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let settlement = state
        .payments
        .mark_paid(order_id, req.payment_method, req.discount_percent)
        .await?;
    Ok(Json(InvoiceResponse::from_settlement(settlement)))
}

/// DELETE /orders/{id}?expected_version=N — hard-remove an unpaid order.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<axum::http::StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state
        .orders
        .delete_order(order_id, Version::new(params.expected_version))
        .await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
