use std::collections::HashMap;

use parking_lot::RwLock;
use pplx_common::StorageError;

use super::{Durability, KeyValueStore, StorageScope};

/// In-process store. Durability is ignored: nothing outlives the value.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(StorageScope, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str, scope: StorageScope) -> Option<String> {
        self.entries.read().get(&(scope, key.to_string())).cloned()
    }

    fn set(
        &self,
        key: &str,
        value: &str,
        scope: StorageScope,
        _durability: Durability,
    ) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert((scope, key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str, scope: StorageScope) -> Result<(), StorageError> {
        self.entries.write().remove(&(scope, key.to_string()));
        Ok(())
    }
}
