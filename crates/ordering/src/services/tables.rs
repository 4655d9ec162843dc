//! Table registry trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::TableId;
use serde::{Deserialize, Serialize};

use crate::error::OrderingError;

/// Occupancy status of a dining table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
}

/// A table as seen by the order engine.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub table_id: TableId,
    /// Display-facing number, distinct from the id.
    pub table_number: u32,
    pub capacity: u32,
    pub status: TableStatus,
}

/// Read-only lookup into the table management collaborator.
#[async_trait]
pub trait TableRegistry: Send + Sync {
    /// Looks up a table. Returns None for unknown ids.
    async fn lookup(&self, table_id: TableId) -> Result<Option<TableInfo>, OrderingError>;
}

/// In-memory table registry for tests and the default server state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableRegistry {
    tables: Arc<RwLock<HashMap<TableId, TableInfo>>>,
}

impl InMemoryTableRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an available table and returns its id.
    pub fn add_table(&self, table_number: u32, capacity: u32) -> TableId {
        let table_id = TableId::new();
        self.tables.write().unwrap().insert(
            table_id,
            TableInfo {
                table_id,
                table_number,
                capacity,
                status: TableStatus::Available,
            },
        );
        table_id
    }

    /// Changes a table's occupancy status.
    pub fn set_status(&self, table_id: TableId, status: TableStatus) {
        if let Some(table) = self.tables.write().unwrap().get_mut(&table_id) {
            table.status = status;
        }
    }
}

#[async_trait]
impl TableRegistry for InMemoryTableRegistry {
    async fn lookup(&self, table_id: TableId) -> Result<Option<TableInfo>, OrderingError> {
        Ok(self.tables.read().unwrap().get(&table_id).cloned())
    }
}
