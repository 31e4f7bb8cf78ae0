//! Redis hash store (feature-gated).

use std::collections::HashMap;

use async_trait::async_trait;
use deadpool_redis::{
    Config, Connection, Pool, Runtime,
    redis::{AsyncCommands, cmd},
};
use drsession_core::{HashStore, StoreError};

/// Default Redis URL.
pub const DEFAULT_URL: &str = "redis://127.0.0.1:6379";

/// Redis storage implementation backed by a connection pool.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

fn op_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Operation(e.to_string())
}

impl RedisStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build a pool from connection parameters without connecting.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Build a pool from a URL without connecting.
    ///
    /// # Errors
    /// Returns error if the URL is invalid.
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        Self::from_config(&Config::from_url(url))
    }

    /// Build a pool from a URL and verify the server answers.
    ///
    /// # Errors
    /// Returns error if no connection can be established.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let store = Self::from_url(url)?;
        store.ping().await?;
        tracing::debug!(url, "Connected to Redis");
        Ok(store)
    }

    /// Check out one connection and issue `PING`.
    ///
    /// # Errors
    /// Returns error if the server cannot be reached.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let _: String = cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn conn(&self) -> Result<Connection, StoreError> {
        self.pool.get().await.map_err(op_err)
    }
}

#[async_trait]
impl HashStore for RedisStore {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        tracing::trace!(key, field, "HGET");
        self.conn().await?.hget(key, field).await.map_err(op_err)
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), StoreError> {
        tracing::trace!(key, field, "HSET");
        let _: i64 = self.conn().await?.hset(key, field, value).await.map_err(op_err)?;
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        tracing::trace!(key, field, "HDEL");
        let removed: i64 = self.conn().await?.hdel(key, field).await.map_err(op_err)?;
        Ok(removed > 0)
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        tracing::trace!(key, field, "HEXISTS");
        self.conn().await?.hexists(key, field).await.map_err(op_err)
    }

    async fn hlen(&self, key: &str) -> Result<usize, StoreError> {
        tracing::trace!(key, "HLEN");
        self.conn().await?.hlen(key).await.map_err(op_err)
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        tracing::trace!(key, "HGETALL");
        let all: HashMap<String, String> =
            self.conn().await?.hgetall(key).await.map_err(op_err)?;
        Ok(all.into_iter().collect())
    }

    async fn hvals(&self, key: &str) -> Result<Vec<String>, StoreError> {
        tracing::trace!(key, "HVALS");
        self.conn().await?.hvals(key).await.map_err(op_err)
    }

    async fn hkeys(&self, key: &str) -> Result<Vec<String>, StoreError> {
        tracing::trace!(key, "HKEYS");
        self.conn().await?.hkeys(key).await.map_err(op_err)
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        // HSET with no field/value pairs is a protocol error.
        if fields.is_empty() {
            return Ok(());
        }
        tracing::trace!(key, count = fields.len(), "HSET (multiple)");
        self.conn()
            .await?
            .hset_multiple(key, fields)
            .await
            .map_err(op_err)
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        tracing::trace!(key, "DEL");
        let removed: i64 = self.conn().await?.del(key).await.map_err(op_err)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_URL.to_string())
    }

    #[test]
    fn test_invalid_url_is_connection_error() {
        let err = RedisStore::from_url("not a url").err().unwrap();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_connect() {
        let err = RedisStore::connect("redis://127.0.0.1:1").await.err().unwrap();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_hash_round_trips() {
        let store = RedisStore::connect(&redis_url()).await.unwrap();
        let key = "drsession-test:redis-store";
        store.del(key).await.unwrap();

        store.hset(key, "foo", "\"bar\"".to_string()).await.unwrap();
        assert_eq!(store.hget(key, "foo").await.unwrap().as_deref(), Some("\"bar\""));
        assert!(store.hexists(key, "foo").await.unwrap());
        assert_eq!(store.hlen(key).await.unwrap(), 1);

        store
            .hset_multiple(key, &[("a".to_string(), "1".to_string())])
            .await
            .unwrap();
        assert_eq!(store.hkeys(key).await.unwrap().len(), 2);
        assert_eq!(store.hvals(key).await.unwrap().len(), 2);
        assert_eq!(store.hgetall(key).await.unwrap().len(), 2);

        assert!(store.hdel(key, "foo").await.unwrap());
        assert!(store.del(key).await.unwrap());
        assert_eq!(store.hlen(key).await.unwrap(), 0);
    }
}
