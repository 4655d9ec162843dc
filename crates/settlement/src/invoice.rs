//! Deterministic invoice projection.

use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{DiscountPercent, Money, Order, PaymentMethod};
use serde::{Deserialize, Serialize};

use crate::error::SettlementError;

/// A single billed line on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// An immutable record of a settled order.
///
/// Projected purely from the committed order snapshot: the settlement time
/// comes from the snapshot's own `paid_at`, never from the wall clock, and
/// the invoice number is derived from the order id. The same snapshot
/// therefore always projects to the identical invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_number: String,
    pub order_id: OrderId,
    pub table_number: u32,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub discount_percent: DiscountPercent,
    pub discount_amount: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub settled_at: DateTime<Utc>,
}

impl Invoice {
    /// Projects an invoice from a paid order snapshot.
    ///
    /// Fails with `NotSettled` if the order has not been paid; a snapshot
    /// without payment details has nothing to invoice.
    pub fn project(order: &Order) -> Result<Invoice, SettlementError> {
        if !order.is_paid() {
            return Err(SettlementError::NotSettled(order.id()));
        }
        let (Some(payment_method), Some(settled_at)) = (order.payment_method(), order.paid_at())
        else {
            return Err(SettlementError::NotSettled(order.id()));
        };

        let totals = order.totals();
        let lines = order
            .items()
            .iter()
            .map(|item| InvoiceLine {
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.line_subtotal(),
            })
            .collect();

        Ok(Invoice {
            invoice_number: invoice_number(order.id()),
            order_id: order.id(),
            table_number: order.table_number(),
            lines,
            subtotal: totals.subtotal,
            discount_percent: order.discount_percent(),
            discount_amount: totals.discount_amount,
            total: totals.total,
            payment_method,
            settled_at,
        })
    }
}

/// Derives the display invoice number from the order id.
fn invoice_number(order_id: OrderId) -> String {
    format!("INV-{}", order_id.as_uuid().simple())
}
