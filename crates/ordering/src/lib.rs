//! Intent layer over the order store.
//!
//! [`OrderService`] is the single entry point for every order mutation short
//! of settlement: creation (with price and name snapshots taken from the
//! menu catalog), item additions, and status transitions for orders and
//! their lines. Table availability and menu lookups go through the
//! [`TableRegistry`] and [`MenuCatalog`] collaborator traits; the in-memory
//! implementations back tests and the default server state.

mod error;
mod service;
mod services;

pub use error::OrderingError;
pub use service::{NewOrderItem, OrderService};
pub use services::catalog::{InMemoryMenuCatalog, MenuCatalog, MenuItemInfo};
pub use services::tables::{InMemoryTableRegistry, TableInfo, TableRegistry, TableStatus};
