//! Pure domain model for the restaurant order engine.
//!
//! Everything in this crate is synchronous, deterministic, and free of I/O:
//! the status state machine, the `Order` aggregate with its invariants, and
//! the billing computation. Persistence and orchestration live in the
//! `order-store`, `ordering`, and `settlement` crates.

mod billing;
mod error;
mod money;
mod order;
mod status;

pub use billing::{Totals, compute_totals};
pub use error::OrderError;
pub use money::{DiscountPercent, Money};
pub use order::{
    MenuItemId, Order, OrderItem, OrderItemId, PaymentMethod, TableId, validate_mutation,
};
pub use status::{ItemStatus, OrderStatus};
