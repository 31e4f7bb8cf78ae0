//! Core traits for session record storage.

use async_trait::async_trait;
use thiserror::Error;

/// Store error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store connection could not be established.
    #[error("Store connection error: {0}")]
    Connection(String),
    /// A single store round trip failed.
    #[error("Store operation error: {0}")]
    Operation(String),
}

/// Trait for hash-structured key-value stores.
///
/// Every method is exactly one round trip. A record springs into existence
/// on its first field write and disappears with its last field; backends
/// must not distinguish "never created" from "empty".
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Read one field of a record.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Write one field of a record.
    async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), StoreError>;

    /// Remove one field. Returns whether it existed.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Check whether a field exists.
    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Number of fields in a record.
    async fn hlen(&self, key: &str) -> Result<usize, StoreError>;

    /// All field/value pairs of a record.
    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// All values of a record.
    async fn hvals(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// All field names of a record.
    async fn hkeys(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Write several fields in one atomic command.
    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    /// Delete a whole record. Returns whether it existed.
    async fn del(&self, key: &str) -> Result<bool, StoreError>;
}
