//! Redis-backed lock & state cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use infrakit_core::error::CacheError;
use infrakit_core::ports::StateCache;
use infrakit_core::types::{AppName, LockKey, StateSnapshot};

use crate::{lock_key, state_key, ttl_secs};

/// One multiplexed connection shared by every call; `ConnectionManager`
/// reconnects on its own after transient failures.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(backend)?;
        let conn = ConnectionManager::new(client).await.map_err(backend)?;
        tracing::debug!("connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl StateCache for RedisCache {
    async fn acquire(&self, key: &LockKey, ttl: Duration) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        // SET NX replies OK when it wrote and nil when the key already existed.
        let reply: Option<String> = redis::cmd("SET")
            .arg(lock_key(key))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(reply.is_some())
    }

    async fn release(&self, key: &LockKey) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _removed: i64 = redis::cmd("DEL")
            .arg(lock_key(key))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
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
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(state_key(name))
            .arg(payload)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_state(&self, name: &AppName) -> Result<Option<StateSnapshot>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(state_key(name))
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        raw.map(|raw| {
            serde_json::from_str(&raw).map_err(|source| CacheError::Decode {
                name: name.to_string(),
                source,
            })
        })
        .transpose()
    }
}

fn backend(err: redis::RedisError) -> CacheError {
    CacheError::Backend(Box::new(err))
}
