//! # TTL Key-Value Store
//!
//! Storage contract backing user sessions and PKCE codes: a key-value store
//! whose entries expire. Sessions live for days, PKCE codes for minutes; both
//! share the same contract and differ only in key prefix and record type.
//!
//! ## Contract
//!
//! | Op | Semantics |
//! |----|-----------|
//! | `build_key` | Prefix + id; prefixes keep record types collision-free |
//! | `add` | Insert or overwrite with TTL; `ttl = 0` is a no-op |
//! | `get` | Value or absent |
//! | `exists` | Presence check |
//! | `pop` | `get` then `delete`; a missed `get` returns absent without deleting |
//! | `refresh_ttl` | Set new TTL and return the value, or absent |
//! | `delete` | Idempotent; reports whether a key was removed |
//!
//! Records are serialized as JSON. The store must expire entries at or
//! before `now + ttl`; it is not required to be transactional across
//! operations.
//!
//! ## Key Naming
//!
//! | Prefix | Record | TTL |
//! |--------|--------|-----|
//! | `session:` | user session | 7 days, slid forward on refresh |
//! | `codes:` | PKCE codes keyed by `state` | ~200 seconds, single use |
//!
//! ## Implementations
//!
//! - [`RedisStore`] - production store over a `ConnectionManager`
//! - [`MemoryStore`] - in-process store for tests and local development

use crate::errors::{AuthError, AuthResult};
use async_trait::async_trait;
pub use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// =============================================================================
// Contract
// =============================================================================

/// TTL key-value storage over a record type `T`.
///
/// Implementations take the *bare* record id on every operation and apply
/// [`Store::build_key`] internally, so callers never concatenate prefixes.
#[async_trait]
pub trait Store<T>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Derives the storage key for a record id.
    ///
    /// Stable for a given id; distinct record types must use distinct
    /// prefixes so keys cannot collide.
    fn build_key(&self, id: &str) -> String;

    /// Inserts or overwrites a record with the given TTL in seconds.
    ///
    /// A zero TTL (the record is already expired) is a no-op.
    async fn add(&self, id: &str, record: &T, ttl_seconds: u64) -> AuthResult<()>;

    /// Returns the record, or `None` when absent or expired.
    async fn get(&self, id: &str) -> AuthResult<Option<T>>;

    /// Presence check.
    async fn exists(&self, id: &str) -> AuthResult<bool>;

    /// Retrieves and removes a record in one call.
    ///
    /// A missed `get` returns `None` without deleting anything, which makes
    /// `pop` the authoritative single-use consumer for PKCE codes.
    async fn pop(&self, id: &str) -> AuthResult<Option<T>> {
        match self.get(id).await? {
            Some(record) => {
                self.delete(id).await?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Sets a new TTL on an existing record and returns the current value,
    /// or `None` when the record is absent.
    async fn refresh_ttl(&self, id: &str, ttl_seconds: u64) -> AuthResult<Option<T>>;

    /// Removes a record. Idempotent; returns whether a key was removed.
    async fn delete(&self, id: &str) -> AuthResult<bool>;
}

// =============================================================================
// Redis Implementation
// =============================================================================

/// Opens a Redis connection manager.
///
/// Called once at startup; the manager reconnects automatically and is
/// cheap to clone into each concrete store.
pub async fn connect(url: &str) -> AuthResult<ConnectionManager> {
    let client = redis::Client::open(url).map_err(AuthError::Redis)?;
    ConnectionManager::new(client).await.map_err(AuthError::Redis)
}

/// Redis-backed store with automatic reconnection.
///
/// Values are stored as JSON strings under `{prefix}:{id}` keys with
/// per-record TTLs (`SET ... EX`). Cloning is cheap - the connection
/// manager is `Arc`-based.
#[derive(Clone)]
pub struct RedisStore<T> {
    conn: ConnectionManager,
    prefix: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> RedisStore<T> {
    /// Creates a store over an established connection manager.
    ///
    /// `prefix` names the record type in the key space (`session`, `codes`).
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            _record: PhantomData,
        }
    }

    /// Connects to Redis and returns a store.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> AuthResult<Self> {
        Ok(Self::new(connect(url).await?, prefix))
    }
}

#[async_trait]
impl<T> Store<T> for RedisStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn build_key(&self, id: &str) -> String {
        format!("{}:{}", self.prefix, id)
    }

    async fn add(&self, id: &str, record: &T, ttl_seconds: u64) -> AuthResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let payload = serde_json::to_string(record)
            .map_err(|e| AuthError::Internal(format!("Record serialization failed: {e}")))?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.build_key(id), payload, ttl_seconds)
            .await
            .map_err(AuthError::Redis)?;
        Ok(())
    }

    async fn get(&self, id: &str) -> AuthResult<Option<T>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(self.build_key(id)).await.map_err(AuthError::Redis)?;
        match payload {
            Some(json) => {
                let record = serde_json::from_str(&json)
                    .map_err(|e| AuthError::Internal(format!("Record deserialization failed: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, id: &str) -> AuthResult<bool> {
        let mut conn = self.conn.clone();
        conn.exists(self.build_key(id)).await.map_err(AuthError::Redis)
    }

    async fn refresh_ttl(&self, id: &str, ttl_seconds: u64) -> AuthResult<Option<T>> {
        let mut conn = self.conn.clone();
        let updated: bool = conn
            .expire(self.build_key(id), ttl_seconds as i64)
            .await
            .map_err(AuthError::Redis)?;
        if !updated {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: &str) -> AuthResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(self.build_key(id)).await.map_err(AuthError::Redis)?;
        Ok(removed > 0)
    }
}

impl<T> std::fmt::Debug for RedisStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// In-process store for tests and local development.
///
/// Implements the full contract, including lazy expiry: a read past an
/// entry's deadline behaves as if the entry were gone.
#[derive(Default)]
pub struct MemoryStore<T> {
    entries: Mutex<HashMap<String, MemoryEntry>>,
    prefix: String,
    _record: PhantomData<fn() -> T>,
}

struct MemoryEntry {
    payload: String,
    deadline: Instant,
}

impl<T> MemoryStore<T> {
    /// Creates an empty store with the given key prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            prefix: prefix.into(),
            _record: PhantomData,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>> {
        // Lock poisoning only happens if a holder panicked; propagating the
        // inner map keeps tests informative.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<T> Store<T> for MemoryStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn build_key(&self, id: &str) -> String {
        format!("{}:{}", self.prefix, id)
    }

    async fn add(&self, id: &str, record: &T, ttl_seconds: u64) -> AuthResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let payload = serde_json::to_string(record)
            .map_err(|e| AuthError::Internal(format!("Record serialization failed: {e}")))?;
        let entry = MemoryEntry {
            payload,
            deadline: Instant::now() + Duration::from_secs(ttl_seconds),
        };
        self.lock().insert(self.build_key(id), entry);
        Ok(())
    }

    async fn get(&self, id: &str) -> AuthResult<Option<T>> {
        let key = self.build_key(id);
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(entry) if entry.deadline > Instant::now() => {
                let record = serde_json::from_str(&entry.payload)
                    .map_err(|e| AuthError::Internal(format!("Record deserialization failed: {e}")))?;
                Ok(Some(record))
            }
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, id: &str) -> AuthResult<bool> {
        let key = self.build_key(id);
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(entry) if entry.deadline > Instant::now() => Ok(true),
            Some(_) => {
                entries.remove(&key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn refresh_ttl(&self, id: &str, ttl_seconds: u64) -> AuthResult<Option<T>> {
        let key = self.build_key(id);
        {
            let mut entries = self.lock();
            match entries.get_mut(&key) {
                Some(entry) if entry.deadline > Instant::now() => {
                    entry.deadline = Instant::now() + Duration::from_secs(ttl_seconds);
                }
                Some(_) => {
                    entries.remove(&key);
                    return Ok(None);
                }
                None => return Ok(None),
            }
        }
        self.get(id).await
    }

    async fn delete(&self, id: &str) -> AuthResult<bool> {
        let key = self.build_key(id);
        Ok(self.lock().remove(&key).is_some())
    }
}

impl<T> std::fmt::Debug for MemoryStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    fn record() -> Record {
        Record {
            name: "alpha".to_string(),
            count: 3,
        }
    }

    #[tokio::test]
    async fn test_add_and_get_round_trip() {
        let store: MemoryStore<Record> = MemoryStore::new("test");
        store.add("k1", &record(), 60).await.unwrap();

        let found = store.get("k1").await.unwrap();
        assert_eq!(found, Some(record()));
    }

    #[tokio::test]
    async fn test_get_absent_returns_none() {
        let store: MemoryStore<Record> = MemoryStore::new("test");
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_add_is_noop() {
        let store: MemoryStore<Record> = MemoryStore::new("test");
        store.add("k1", &record(), 0).await.unwrap();

        assert!(!store.exists("k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_pop_is_single_use() {
        let store: MemoryStore<Record> = MemoryStore::new("test");
        store.add("state-1", &record(), 60).await.unwrap();

        assert_eq!(store.pop("state-1").await.unwrap(), Some(record()));
        assert_eq!(store.pop("state-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store: MemoryStore<Record> = MemoryStore::new("test");
        store.add("k1", &record(), 60).await.unwrap();

        assert!(store.delete("k1").await.unwrap());
        assert!(!store.delete("k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_ttl_returns_value_when_present() {
        let store: MemoryStore<Record> = MemoryStore::new("test");
        store.add("k1", &record(), 60).await.unwrap();

        let refreshed = store.refresh_ttl("k1", 120).await.unwrap();
        assert_eq!(refreshed, Some(record()));
    }

    #[tokio::test]
    async fn test_refresh_ttl_absent_returns_none() {
        let store: MemoryStore<Record> = MemoryStore::new("test");
        assert_eq!(store.refresh_ttl("missing", 120).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store: MemoryStore<Record> = MemoryStore::new("test");
        store.add("k1", &record(), 1).await.unwrap();
        assert!(store.exists("k1").await.unwrap());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!store.exists("k1").await.unwrap());
        assert_eq!(store.get("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prefixes_partition_the_key_space() {
        let sessions: MemoryStore<Record> = MemoryStore::new("session");
        let codes: MemoryStore<Record> = MemoryStore::new("codes");

        assert_eq!(sessions.build_key("abc"), "session:abc");
        assert_eq!(codes.build_key("abc"), "codes:abc");
        assert_ne!(sessions.build_key("abc"), codes.build_key("abc"));
    }
}
