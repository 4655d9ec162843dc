//! Settlement: marking orders paid and projecting invoices.
//!
//! [`PaymentCoordinator::mark_paid`] is the single entry point for settling
//! an order. It is idempotent (a duplicate call returns the same invoice it
//! produced the first time and changes nothing) and it commits the payment
//! flags, the resolved discount, and the settlement time in one versioned
//! store commit, which is the linearization point. [`Invoice`] is a pure
//! projection of the committed snapshot: same snapshot in, same bytes out.

mod coordinator;
mod error;
mod invoice;

pub use coordinator::{PaymentCoordinator, Settlement};
pub use error::SettlementError;
pub use invoice::{Invoice, InvoiceLine};
