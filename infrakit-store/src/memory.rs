//! In-process implementations of the cache and record store.
//!
//! Same contracts as the Redis and PostgreSQL clients, scoped to a single
//! process. Expiry runs on `tokio::time`, so paused-clock tests are exact.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use infrakit_core::error::{CacheError, RecordStoreError};
use infrakit_core::ports::{RecordStore, StateCache};
use infrakit_core::types::{AppName, ApplicationRecord, LockKey, StateSnapshot};

use crate::{lock_key, state_key};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// TTL'd key-value map standing in for Redis.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value for `key`, if present and unexpired.
    pub async fn raw(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        live_entry(&mut entries, key).map(|e| e.value.clone())
    }

    /// Store a raw value, bypassing snapshot encoding.
    pub async fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        store(&mut entries, key.into(), value.into(), ttl);
    }
}

/// Inserts `key`, dropping every expired entry on the way.
fn store(entries: &mut HashMap<String, Entry>, key: String, value: String, ttl: Duration) {
    let now = Instant::now();
    entries.retain(|_, e| e.expires_at > now);
    entries.insert(
        key,
        Entry {
            value,
            expires_at: now + ttl,
        },
    );
}

/// Returns the entry for `key`, evicting it first if it has expired.
fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a Entry> {
    let expired = entries
        .get(key)
        .is_some_and(|e| e.expires_at <= Instant::now());
    if expired {
        entries.remove(key);
    }
    entries.get(key)
}

#[async_trait]
impl StateCache for MemoryCache {
    async fn acquire(&self, key: &LockKey, ttl: Duration) -> Result<bool, CacheError> {
        let key = lock_key(key);
        let mut entries = self.entries.lock().await;
        if live_entry(&mut entries, &key).is_some() {
            return Ok(false);
        }
        store(&mut entries, key, "1".to_string(), ttl);
        Ok(true)
    }

    async fn release(&self, key: &LockKey) -> Result<(), CacheError> {
        self.entries.lock().await.remove(&lock_key(key));
        Ok(())
    }

    async fn put_state(
        &self,
        name: &AppName,
        snapshot: &StateSnapshot,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload =
            serde_json::to_string(snapshot).map_err(|e| CacheError::Backend(Box::new(e)))?;
        self.insert_raw(state_key(name), payload, ttl).await;
        Ok(())
    }

    async fn get_state(&self, name: &AppName) -> Result<Option<StateSnapshot>, CacheError> {
        let Some(raw) = self.raw(&state_key(name)).await else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::Decode {
                name: name.to_string(),
                source,
            })
    }
}

/// Name-keyed record map standing in for PostgreSQL.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<AppName, ApplicationRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert_application(
        &self,
        record: &ApplicationRecord,
    ) -> Result<(), RecordStoreError> {
        let mut stored = record.clone();
        stored.updated_at = Utc::now();
        self.records
            .lock()
            .await
            .insert(stored.name.clone(), stored);
        Ok(())
    }

    async fn get_application(
        &self,
        name: &AppName,
    ) -> Result<Option<ApplicationRecord>, RecordStoreError> {
        Ok(self.records.lock().await.get(name).cloned())
    }
}
