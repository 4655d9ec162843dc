//! The `Order` aggregate and its line items.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::{Totals, compute_totals};
use crate::error::OrderError;
use crate::money::{DiscountPercent, Money};
use crate::status::{ItemStatus, OrderStatus};

/// Unique identifier for a dining table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(Uuid);

impl TableId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TableId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a catalog menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuItemId(Uuid);

impl MenuItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MenuItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MenuItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a single line on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderItemId(Uuid);

impl OrderItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Qr,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Qr => "qr",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A line on an order.
///
/// `name` and `unit_price` are snapshots taken from the catalog at add time.
/// Catalog edits after that point must not retroactively change what this
/// order is worth, so the snapshot fields are frozen for the line's lifetime;
/// only `status` moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub status: ItemStatus,
}

impl OrderItem {
    /// Creates a new pending line with a fresh id.
    pub fn new(
        menu_item_id: MenuItemId,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            id: OrderItemId::new(),
            menu_item_id,
            name: name.into(),
            quantity,
            unit_price,
            status: ItemStatus::Pending,
        }
    }

    /// Returns the line subtotal (unit price x quantity).
    pub fn line_subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    fn validate(&self) -> Result<(), OrderError> {
        if self.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: self.quantity,
            });
        }
        if self.unit_price.is_negative() {
            return Err(OrderError::InvalidPrice {
                cents: self.unit_price.cents(),
            });
        }
        Ok(())
    }
}

/// The order aggregate: one table's running bill plus its kitchen lifecycle.
///
/// All mutation goes through the methods below; each one consults the status
/// state machine before changing anything. The store re-checks the same rules
/// at commit time (see [`validate_mutation`]), so a new entry point cannot
/// silently bypass them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    table_id: TableId,
    /// Display-facing table number, snapshotted at creation for the invoice.
    table_number: u32,
    status: OrderStatus,
    discount_percent: DiscountPercent,
    is_paid: bool,
    payment_method: Option<PaymentMethod>,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    items: Vec<OrderItem>,
}

impl Order {
    /// Creates a new pending order with its initial lines.
    ///
    /// An order opens with at least one line; an empty order has nothing for
    /// the kitchen to do and nothing to bill.
    pub fn new(
        id: OrderId,
        table_id: TableId,
        table_number: u32,
        discount_percent: DiscountPercent,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let order = Self {
            id,
            table_id,
            table_number,
            status: OrderStatus::Pending,
            discount_percent,
            is_paid: false,
            payment_method: None,
            created_at,
            paid_at: None,
            items,
        };
        order.validate()?;
        Ok(order)
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn table_number(&self) -> u32 {
        self.table_number
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn discount_percent(&self) -> DiscountPercent {
        self.discount_percent
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Returns the lines in insertion order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns a line by id.
    pub fn item(&self, item_id: OrderItemId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Returns true while the order still accepts new lines:
    /// not yet served out, and not yet paid.
    pub fn accepts_items(&self) -> bool {
        !self.is_paid
            && matches!(
                self.status,
                OrderStatus::Pending | OrderStatus::Preparing | OrderStatus::Ready
            )
    }

    /// Computes the current monetary breakdown from the line snapshots.
    pub fn totals(&self) -> Totals {
        compute_totals(&self.items, self.discount_percent)
    }
}

// Mutation methods
impl Order {
    /// Appends lines to the order.
    pub fn add_items(&mut self, items: Vec<OrderItem>) -> Result<(), OrderError> {
        if !self.accepts_items() {
            return Err(OrderError::OrderClosed {
                status: self.status,
                is_paid: self.is_paid,
            });
        }
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &items {
            item.validate()?;
        }
        self.items.extend(items);
        Ok(())
    }

    /// Moves the order to `requested`, if the state machine allows it.
    pub fn transition(&mut self, requested: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(requested) {
            return Err(OrderError::InvalidTransition {
                current: self.status,
                requested,
            });
        }
        self.status = requested;
        Ok(())
    }

    /// Moves a single line to `requested`, if the state machine allows it.
    ///
    /// Once the order itself is terminal, its lines are frozen.
    pub fn transition_item(
        &mut self,
        item_id: OrderItemId,
        requested: ItemStatus,
    ) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::OrderClosed {
                status: self.status,
                is_paid: self.is_paid,
            });
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(OrderError::ItemNotFound { item_id })?;
        if !item.status.can_transition_to(requested) {
            return Err(OrderError::InvalidItemTransition {
                current: item.status,
                requested,
            });
        }
        item.status = requested;
        Ok(())
    }

    /// Marks the order paid with the resolved discount.
    ///
    /// The caller resolves which discount applies (a payment-time override
    /// replaces the creation-time value); whatever is committed here is what
    /// the invoice will be derived from. Cancelled orders cannot be settled;
    /// any other status can, since cashiers may pre-settle before serving.
    pub fn settle(
        &mut self,
        method: PaymentMethod,
        discount_percent: DiscountPercent,
        paid_at: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.is_paid {
            return Err(OrderError::AlreadyPaid);
        }
        if self.status == OrderStatus::Cancelled {
            return Err(OrderError::NotPayable {
                status: self.status,
            });
        }
        self.discount_percent = discount_percent;
        self.is_paid = true;
        self.payment_method = Some(method);
        self.paid_at = Some(paid_at);
        Ok(())
    }

    /// Checks the entity invariants of the aggregate in isolation.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &self.items {
            item.validate()?;
        }
        if self.is_paid && (self.payment_method.is_none() || self.paid_at.is_none()) {
            return Err(OrderError::MissingPaymentDetails);
        }
        Ok(())
    }
}

/// Checks that `after` is a legal successor of `before` for a single commit.
///
/// This is the cross-mutation guard the store runs on every commit, on top of
/// [`Order::validate`]: identity fields frozen, `is_paid` monotonic, settled
/// money frozen, status deltas legal per the transition tables, and lines
/// append-only with status as their only mutable field.
pub fn validate_mutation(before: &Order, after: &Order) -> Result<(), OrderError> {
    if after.id != before.id
        || after.table_id != before.table_id
        || after.table_number != before.table_number
        || after.created_at != before.created_at
    {
        return Err(OrderError::IdentityChanged);
    }

    if before.is_paid && !after.is_paid {
        return Err(OrderError::PaymentReverted);
    }

    if before.is_paid
        && (after.discount_percent != before.discount_percent
            || after.payment_method != before.payment_method
            || after.paid_at != before.paid_at
            || after.items.len() != before.items.len())
    {
        return Err(OrderError::SettledOrderModified);
    }

    if after.status != before.status && !before.status.can_transition_to(after.status) {
        return Err(OrderError::InvalidTransition {
            current: before.status,
            requested: after.status,
        });
    }

    if after.items.len() < before.items.len() {
        return Err(OrderError::ItemsRemoved);
    }

    for (prev, next) in before.items.iter().zip(&after.items) {
        if next.id != prev.id
            || next.menu_item_id != prev.menu_item_id
            || next.name != prev.name
            || next.quantity != prev.quantity
            || next.unit_price != prev.unit_price
        {
            return Err(OrderError::ItemMutated { item_id: prev.id });
        }
        if next.status != prev.status {
            if before.status.is_terminal() {
                return Err(OrderError::OrderClosed {
                    status: before.status,
                    is_paid: before.is_paid,
                });
            }
            if !prev.status.can_transition_to(next.status) {
                return Err(OrderError::InvalidItemTransition {
                    current: prev.status,
                    requested: next.status,
                });
            }
        }
    }

    if after.items.len() > before.items.len() && !before.accepts_items() {
        return Err(OrderError::OrderClosed {
            status: before.status,
            is_paid: before.is_paid,
        });
    }

    Ok(())
}
