//! Billing computation: subtotal, discount, total.
//!
//! Pure and deterministic so invoices are reproducible: the same line items
//! and discount always produce the same totals, regardless of the order the
//! lines were added in.

use serde::{Deserialize, Serialize};

use crate::money::{DiscountPercent, Money};
use crate::order::OrderItem;

/// The computed monetary breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
}

/// Computes subtotal, discount amount, and total for a set of lines.
///
/// The discount amount is `subtotal * percent / 100`, rounded half-up to the
/// cent. Half-up is the single rounding rule of the whole system; there is no
/// other rounding site. The total is clamped to never go below zero.
pub fn compute_totals(items: &[OrderItem], discount: DiscountPercent) -> Totals {
    let subtotal = items
        .iter()
        .fold(Money::zero(), |acc, item| acc + item.line_subtotal());

    let discount_amount = discount_amount(subtotal, discount);
    let total_cents = (subtotal - discount_amount).cents().max(0);

    Totals {
        subtotal,
        discount_amount,
        total: Money::from_cents(total_cents),
    }
}

/// Rounds `subtotal * percent / 100` half-up in the cents domain.
fn discount_amount(subtotal: Money, discount: DiscountPercent) -> Money {
    let cents = i128::from(subtotal.cents());
    let percent = i128::from(discount.as_u8());
    let rounded = (cents * percent + 50) / 100;
    Money::from_cents(rounded as i64)
}
