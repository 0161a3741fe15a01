use crate::storage::TablePtr;

use std::{collections::HashMap, option::Option, sync::RwLock};

/// In-memory registry of the tables the host has opened, keyed by table
/// name. Nothing here is persisted.
#[derive(Default)]
pub struct CatalogCache {
    table_cache: RwLock<HashMap<String, TablePtr>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self {
            table_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_table(&self, name: &str, table: TablePtr) -> Option<TablePtr> {
        let mut guard = self.table_cache.write().unwrap();
        guard.insert(name.to_string(), table)
    }

    pub fn lookup_table(&self, name: &str) -> Option<TablePtr> {
        let guard = self.table_cache.read().unwrap();
        guard.get(name).cloned()
    }
}
