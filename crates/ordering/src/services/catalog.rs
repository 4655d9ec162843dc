//! Menu catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{MenuItemId, Money};

use crate::error::OrderingError;

/// A catalog entry as seen by the order engine.
///
/// Only read at item-add time: the price and name are copied onto the order
/// line as snapshots, so later catalog edits never touch existing orders.
#[derive(Debug, Clone)]
pub struct MenuItemInfo {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price: Money,
    pub is_available: bool,
}

/// Read-only lookup into the menu catalog collaborator.
#[async_trait]
pub trait MenuCatalog: Send + Sync {
    /// Looks up a menu item. Returns None for unknown ids.
    async fn lookup(&self, menu_item_id: MenuItemId)
    -> Result<Option<MenuItemInfo>, OrderingError>;
}

/// In-memory menu catalog for tests and the default server state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMenuCatalog {
    items: Arc<RwLock<HashMap<MenuItemId, MenuItemInfo>>>,
}

impl InMemoryMenuCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an available item and returns its id.
    pub fn add_item(&self, name: impl Into<String>, price: Money) -> MenuItemId {
        let menu_item_id = MenuItemId::new();
        self.items.write().unwrap().insert(
            menu_item_id,
            MenuItemInfo {
                menu_item_id,
                name: name.into(),
                price,
                is_available: true,
            },
        );
        menu_item_id
    }

    /// Flags an item available or unavailable.
    pub fn set_available(&self, menu_item_id: MenuItemId, available: bool) {
        if let Some(item) = self.items.write().unwrap().get_mut(&menu_item_id) {
            item.is_available = available;
        }
    }

    /// Changes an item's price. Existing order lines keep their snapshots.
    pub fn set_price(&self, menu_item_id: MenuItemId, price: Money) {
        if let Some(item) = self.items.write().unwrap().get_mut(&menu_item_id) {
            item.price = price;
        }
    }

    /// Returns the number of catalog entries.
    pub fn item_count(&self) -> usize {
        self.items.read().unwrap().len()
    }
}

#[async_trait]
impl MenuCatalog for InMemoryMenuCatalog {
    async fn lookup(
        &self,
        menu_item_id: MenuItemId,
    ) -> Result<Option<MenuItemInfo>, OrderingError> {
        Ok(self.items.read().unwrap().get(&menu_item_id).cloned())
    }
}
