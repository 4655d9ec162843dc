//! Durable, versioned storage for order aggregates.
//!
//! Every read returns a [`Version`] token and every write must present the
//! token it read; a stale token fails with [`StoreError::VersionConflict`]
//! and nothing is applied. This is the seam that makes independently-polling
//! clients safe: two waiters editing the same order cannot silently overwrite
//! each other, one commit wins and the other is told to re-fetch.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod version;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::{MutationFn, OrderStore, OrderStoreExt};
pub use version::Version;
