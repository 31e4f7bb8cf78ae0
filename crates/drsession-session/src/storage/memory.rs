//! In-memory hash store.

use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use drsession_core::{HashStore, StoreError};

type Record = HashMap<String, String>;

/// In-memory storage implementation.
///
/// Useful for development and single-process deployments.
/// Data is lost on restart.
pub struct MemoryStore {
    records: RwLock<HashMap<String, Record>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn read_record<T>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&Record>) -> T,
    ) -> Result<T, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Operation(e.to_string()))?;
        Ok(f(records.get(key)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HashStore for MemoryStore {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.read_record(key, |r| r.and_then(|r| r.get(field)).cloned())
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|e| StoreError::Operation(e.to_string()))?
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);

        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Operation(e.to_string()))?;

        let Some(record) = records.get_mut(key) else {
            return Ok(false);
        };
        let removed = record.remove(field).is_some();

        // An emptied record ceases to exist.
        if record.is_empty() {
            records.remove(key);
        }

        Ok(removed)
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.read_record(key, |r| r.is_some_and(|r| r.contains_key(field)))
    }

    async fn hlen(&self, key: &str) -> Result<usize, StoreError> {
        self.read_record(key, |r| r.map_or(0, HashMap::len))
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.read_record(key, |r| {
            r.map(|r| r.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default()
        })
    }

    async fn hvals(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.read_record(key, |r| {
            r.map(|r| r.values().cloned().collect()).unwrap_or_default()
        })
    }

    async fn hkeys(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.read_record(key, |r| r.map(|r| r.keys().cloned().collect()).unwrap_or_default())
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }

        self.records
            .write()
            .map_err(|e| StoreError::Operation(e.to_string()))?
            .entry(key.to_string())
            .or_default()
            .extend(fields.iter().cloned());

        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .records
            .write()
            .map_err(|e| StoreError::Operation(e.to_string()))?
            .remove(key)
            .is_some())
    }
}
