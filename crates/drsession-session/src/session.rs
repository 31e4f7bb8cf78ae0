//! Mapping-style handle over one remote session record.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

use drsession_core::{Codec, CodecError, HashStore, StoreError, Value};

/// Session error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),
    #[error("Failed to serialize field {key}: {source}")]
    Serialization { key: String, source: CodecError },
    #[error("Failed to deserialize field {key}: {source}")]
    Deserialization { key: String, source: CodecError },
    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Live mapping view over one remote hash record.
///
/// The handle caches nothing: every call is a round trip to the store, and
/// the store's per-command atomicity is the only consistency guarantee.
/// Several handles may address the same record at once; concurrent field
/// writes are last-write-wins.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn HashStore>,
    codec: Arc<dyn Codec>,
    key: String,
}

impl Session {
    /// Create a handle for the record at `key`. Never touches the store.
    #[must_use]
    pub fn new(store: Arc<dyn HashStore>, codec: Arc<dyn Codec>, key: impl Into<String>) -> Self {
        Self {
            store,
            codec,
            key: key.into(),
        }
    }

    /// The record key (`prefix + session id`).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn encode(&self, key: &str, value: &Value) -> Result<String, SessionError> {
        self.codec
            .encode(value)
            .map_err(|source| SessionError::Serialization {
                key: key.to_string(),
                source,
            })
    }

    fn decode(&self, key: &str, raw: &str) -> Result<Value, SessionError> {
        self.codec
            .decode(raw)
            .map_err(|source| SessionError::Deserialization {
                key: key.to_string(),
                source,
            })
    }

    /// Store `value` under `key`, creating the record if needed.
    ///
    /// # Errors
    /// Returns error if the value cannot be encoded or the store fails.
    pub async fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), SessionError> {
        let raw = self.encode(key, &value.into())?;
        self.store.hset(&self.key, key, raw).await?;
        Ok(())
    }

    /// Read the value under `key`.
    ///
    /// # Errors
    /// Returns `KeyNotFound` if the field is absent, `Deserialization` if the
    /// stored payload is malformed.
    pub async fn get(&self, key: &str) -> Result<Value, SessionError> {
        let raw = self
            .store
            .hget(&self.key, key)
            .await?
            .ok_or_else(|| SessionError::KeyNotFound(key.to_string()))?;
        self.decode(key, &raw)
    }

    /// Read the value under `key`, or `default` if it is absent or malformed.
    ///
    /// # Errors
    /// Only store failures are surfaced.
    pub async fn get_or_default(&self, key: &str, default: Value) -> Result<Value, SessionError> {
        let Some(raw) = self.store.hget(&self.key, key).await? else {
            return Ok(default);
        };
        match self.decode(key, &raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(record = %self.key, "Treating malformed field as absent: {e}");
                Ok(default)
            }
        }
    }

    /// Remove `key`. Removing an absent field is not an error.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.store.hdel(&self.key, key).await?;
        Ok(())
    }

    /// Whether `key` is present. The payload is not decoded.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub async fn contains(&self, key: &str) -> Result<bool, SessionError> {
        Ok(self.store.hexists(&self.key, key).await?)
    }

    /// Number of fields in the record.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub async fn length(&self) -> Result<usize, SessionError> {
        Ok(self.store.hlen(&self.key).await?)
    }

    /// Whether the record has no fields.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub async fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.length().await? == 0)
    }

    /// All field names.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub async fn keys(&self) -> Result<HashSet<String>, SessionError> {
        Ok(self.store.hkeys(&self.key).await?.into_iter().collect())
    }

    /// All values, each decoded independently.
    ///
    /// # Errors
    /// Unlike [`Session::get_or_default`], a malformed entry fails the whole
    /// call with `Deserialization`.
    pub async fn values(&self) -> Result<Vec<Value>, SessionError> {
        self.store
            .hvals(&self.key)
            .await?
            .iter()
            .map(|raw| self.decode(&self.key, raw))
            .collect()
    }

    /// All field/value pairs, each decoded independently.
    ///
    /// # Errors
    /// A malformed entry fails the whole call with `Deserialization`.
    pub async fn items(&self) -> Result<Vec<(String, Value)>, SessionError> {
        self.store
            .hgetall(&self.key)
            .await?
            .into_iter()
            .map(|(k, raw)| {
                let value = self.decode(&k, &raw)?;
                Ok((k, value))
            })
            .collect()
    }

    /// Write every pair from `source` in one atomic multi-field set.
    ///
    /// Accepts a mapping or any sequence of key/value pairs.
    ///
    /// # Errors
    /// Returns error if any value cannot be encoded (nothing is written) or
    /// the store fails.
    pub async fn update<I, K, V>(&self, source: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.update_with(source, std::iter::empty::<(String, Value)>())
            .await
    }

    /// Like [`Session::update`], with `overrides` applied after `source`.
    ///
    /// # Errors
    /// Returns error if any value cannot be encoded or the store fails.
    pub async fn update_with<I, K, V, O, OK, OV>(
        &self,
        source: I,
        overrides: O,
    ) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
        O: IntoIterator<Item = (OK, OV)>,
        OK: Into<String>,
        OV: Into<Value>,
    {
        let mut fields: Vec<(String, String)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let pairs = source
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .chain(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));

        for (k, v) in pairs {
            let raw = self.encode(&k, &v)?;
            // Later pairs win, as in a dict update.
            if let Some(&i) = index.get(&k) {
                fields[i].1 = raw;
            } else {
                index.insert(k.clone(), fields.len());
                fields.push((k, raw));
            }
        }

        self.store.hset_multiple(&self.key, &fields).await?;
        Ok(())
    }

    /// Read `key` (tolerantly, as [`Session::get_or_default`]) then delete it.
    ///
    /// Not atomic: this is two round trips, and a concurrent writer can land
    /// between the read and the delete. Two concurrent pops may both observe
    /// the value.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub async fn pop(&self, key: &str, default: Value) -> Result<Value, SessionError> {
        let value = self.get_or_default(key, default).await?;
        self.delete(key).await?;
        Ok(value)
    }

    /// Delete the whole record.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.destroy().await
    }

    /// Delete the whole record. Same effect as [`Session::clear`].
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub async fn destroy(&self) -> Result<(), SessionError> {
        self.store.del(&self.key).await?;
        tracing::debug!(record = %self.key, "Destroyed session record");
        Ok(())
    }

    /// Always fails: a detached snapshot would masquerade as live state.
    ///
    /// # Errors
    /// Always returns `NotSupported`.
    pub fn copy(&self) -> Result<HashMap<String, Value>, SessionError> {
        Err(SessionError::NotSupported("copy"))
    }

    /// No-op. Writes are already live.
    pub const fn save(&self) {}

    /// Compare the fully materialized record against `other`.
    ///
    /// # Errors
    /// Returns error if the store fails or an entry is malformed.
    pub async fn equals(&self, other: &HashMap<String, Value>) -> Result<bool, SessionError> {
        let items: HashMap<String, Value> = self.items().await?.into_iter().collect();
        Ok(&items == other)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session<key='{}'>", self.key)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use async_trait::async_trait;

    use super::*;
    use crate::storage::MemoryStore;
    use drsession_core::JsonCodec;

    /// Store whose every command fails.
    struct BrokenStore;

    fn broken() -> StoreError {
        StoreError::Operation("connection reset".to_string())
    }

    #[async_trait]
    impl HashStore for BrokenStore {
        async fn hget(&self, _: &str, _: &str) -> Result<Option<String>, StoreError> {
            Err(broken())
        }
        async fn hset(&self, _: &str, _: &str, _: String) -> Result<(), StoreError> {
            Err(broken())
        }
        async fn hdel(&self, _: &str, _: &str) -> Result<bool, StoreError> {
            Err(broken())
        }
        async fn hexists(&self, _: &str, _: &str) -> Result<bool, StoreError> {
            Err(broken())
        }
        async fn hlen(&self, _: &str) -> Result<usize, StoreError> {
            Err(broken())
        }
        async fn hgetall(&self, _: &str) -> Result<Vec<(String, String)>, StoreError> {
            Err(broken())
        }
        async fn hvals(&self, _: &str) -> Result<Vec<String>, StoreError> {
            Err(broken())
        }
        async fn hkeys(&self, _: &str) -> Result<Vec<String>, StoreError> {
            Err(broken())
        }
        async fn hset_multiple(&self, _: &str, _: &[(String, String)]) -> Result<(), StoreError> {
            Err(broken())
        }
        async fn del(&self, _: &str) -> Result<bool, StoreError> {
            Err(broken())
        }
    }

    fn session() -> Session {
        Session::new(
            Arc::new(MemoryStore::new()),
            Arc::new(JsonCodec),
            "drsession-test:abc123",
        )
    }

    #[tokio::test]
    async fn test_value_types_round_trip() {
        let s = session();
        let values = [
            json!("bar"),
            json!(["bar"]),
            json!({"bar": "woot"}),
            Value::Null,
            json!(true),
            json!(42),
            json!(1.5),
        ];
        for v in values {
            s.set("foo", v.clone()).await.unwrap();
            assert_eq!(s.get("foo").await.unwrap(), v);
        }
    }

    #[tokio::test]
    async fn test_missing_key() {
        let s = session();
        let err = s.get("foo").await.unwrap_err();
        assert!(matches!(err, SessionError::KeyNotFound(k) if k == "foo"));
        assert_eq!(s.get_or_default("foo", Value::Null).await.unwrap(), Value::Null);
        assert_eq!(s.get_or_default("foo", json!("bar")).await.unwrap(), json!("bar"));
    }

    #[tokio::test]
    async fn test_malformed_payload_leniency_is_asymmetric() {
        let store = Arc::new(MemoryStore::new());
        let s = Session::new(store.clone(), Arc::new(JsonCodec), "k");
        store.hset("k", "bad", "{oops".to_string()).await.unwrap();

        assert_eq!(s.get_or_default("bad", json!(7)).await.unwrap(), json!(7));
        assert!(matches!(
            s.get("bad").await.unwrap_err(),
            SessionError::Deserialization { .. }
        ));
        assert!(matches!(
            s.values().await.unwrap_err(),
            SessionError::Deserialization { .. }
        ));
        assert!(matches!(
            s.items().await.unwrap_err(),
            SessionError::Deserialization { .. }
        ));
        // Existence and key listing never decode.
        assert!(s.contains("bad").await.unwrap());
        assert_eq!(s.keys().await.unwrap(), HashSet::from(["bad".to_string()]));
    }

    #[test]
    fn test_display() {
        assert_eq!(session().to_string(), "Session<key='drsession-test:abc123'>");
        assert_eq!(format!("{:?}", session()), "Session<key='drsession-test:abc123'>");
    }

    #[tokio::test]
    async fn test_length_and_delete() {
        let s = session();
        s.set("foo", "bar").await.unwrap();
        assert_eq!(s.length().await.unwrap(), 1);
        s.set("foo2", "bar2").await.unwrap();
        assert_eq!(s.length().await.unwrap(), 2);

        s.delete("foo").await.unwrap();
        s.delete("foo2").await.unwrap();
        assert_eq!(s.length().await.unwrap(), 0);
        assert!(s.is_empty().await.unwrap());
        assert!(!s.contains("foo").await.unwrap());

        // idempotent
        s.delete("foo").await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_and_destroy_are_equivalent() {
        let s = session();
        s.update([("a", 1), ("b", 2), ("c", 3)]).await.unwrap();
        s.clear().await.unwrap();
        assert_eq!(s.length().await.unwrap(), 0);

        s.set("foo", "bar").await.unwrap();
        s.destroy().await.unwrap();
        assert_eq!(s.length().await.unwrap(), 0);

        // Destroying an absent record is fine.
        s.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_forms_agree() {
        let from_map = session();
        from_map.set("a", "old").await.unwrap();
        from_map
            .update(HashMap::from([("a", 1), ("b", 2)]))
            .await
            .unwrap();

        let from_pairs = session();
        from_pairs.update(vec![("a", 1), ("b", 2)]).await.unwrap();

        let from_overrides = session();
        from_overrides
            .update_with([("a", 0)], [("a", 1), ("b", 2)])
            .await
            .unwrap();

        for s in [from_map, from_pairs, from_overrides] {
            assert_eq!(s.get("a").await.unwrap(), json!(1));
            assert_eq!(s.get("b").await.unwrap(), json!(2));
            assert_eq!(s.length().await.unwrap(), 2);
        }
    }

    #[tokio::test]
    async fn test_empty_update_is_noop() {
        let s = session();
        s.update(Vec::<(String, Value)>::new()).await.unwrap();
        assert_eq!(s.length().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pop() {
        let s = session();
        s.set("foo", "bar").await.unwrap();
        assert_eq!(s.pop("foo", Value::Null).await.unwrap(), json!("bar"));
        assert!(!s.contains("foo").await.unwrap());

        assert_eq!(s.pop("foo", json!("dflt")).await.unwrap(), json!("dflt"));
        assert_eq!(s.length().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_pops_both_may_see_value() {
        let s = session();
        s.set("foo", "bar").await.unwrap();

        let (a, b) = tokio::join!(s.pop("foo", Value::Null), s.pop("foo", Value::Null));
        let seen = [a.unwrap(), b.unwrap()]
            .into_iter()
            .filter(|v| *v == json!("bar"))
            .count();
        // Non-atomic: one or two observers, never zero.
        assert!((1..=2).contains(&seen));
        assert!(!s.contains("foo").await.unwrap());
    }

    #[tokio::test]
    async fn test_bulk_reads() {
        let s = session();
        s.set("foo", "bar").await.unwrap();
        assert_eq!(s.keys().await.unwrap(), HashSet::from(["foo".to_string()]));
        assert_eq!(s.values().await.unwrap(), vec![json!("bar")]);
        assert_eq!(
            s.items().await.unwrap(),
            vec![("foo".to_string(), json!("bar"))]
        );
    }

    #[tokio::test]
    async fn test_equals_materializes_record() {
        let s = session();
        s.update([("a", json!(1)), ("b", json!([true]))]).await.unwrap();

        let expected = HashMap::from([("a".to_string(), json!(1)), ("b".to_string(), json!([true]))]);
        assert!(s.equals(&expected).await.unwrap());
        assert!(!s.equals(&HashMap::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_copy_unsupported_and_save_noop() {
        let s = session();
        s.set("foo", "bar").await.unwrap();
        assert!(matches!(s.copy().unwrap_err(), SessionError::NotSupported("copy")));
        s.save();
        assert_eq!(s.get("foo").await.unwrap(), json!("bar"));
    }

    #[tokio::test]
    async fn test_handles_share_record() {
        let store: Arc<dyn HashStore> = Arc::new(MemoryStore::new());
        let a = Session::new(store.clone(), Arc::new(JsonCodec), "shared");
        let b = Session::new(store, Arc::new(JsonCodec), "shared");

        a.set("foo", 1).await.unwrap();
        assert_eq!(b.get("foo").await.unwrap(), json!(1));
        b.set("foo", 2).await.unwrap();
        assert_eq!(a.get("foo").await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_store_failures_propagate() {
        let s = Session::new(Arc::new(BrokenStore), Arc::new(JsonCodec), "k");
        let is_store_err = |r: &Result<(), SessionError>| {
            matches!(r, Err(SessionError::Store(StoreError::Operation(_))))
        };

        assert!(is_store_err(&s.get("foo").await.map(drop)));
        assert!(is_store_err(&s.get_or_default("foo", json!("dflt")).await.map(drop)));
        assert!(is_store_err(&s.pop("foo", json!("dflt")).await.map(drop)));
        assert!(is_store_err(&s.update([("a", 1)]).await));
        assert!(is_store_err(&s.destroy().await));
        assert!(is_store_err(&s.set("a", 1).await));
        assert!(is_store_err(&s.length().await.map(drop)));
    }
}
