//! # infrakit-store
//!
//! Lock & cache client and durable record store.
//!
//! - [`RedisCache`] / [`MemoryCache`] implement [`infrakit_core::StateCache`]
//! - [`PgRecordStore`] / [`MemoryRecordStore`] implement [`infrakit_core::RecordStore`]
//!
//! Both cache implementations use the same key layout:
//!
//! ```text
//! lock:<operation>:<name>   mutual-exclusion lock, value "1", TTL'd
//! app:<name>:state          JSON StateSnapshot, TTL'd
//! ```

pub mod memory;
pub mod postgres;
pub mod redis_cache;

pub use memory::{MemoryCache, MemoryRecordStore};
pub use postgres::PgRecordStore;
pub use redis_cache::RedisCache;

use infrakit_core::types::{AppName, LockKey};

/// Cache key holding a lock.
pub fn lock_key(key: &LockKey) -> String {
    format!("lock:{key}")
}

/// Cache key holding an application's state snapshot.
pub fn state_key(name: &AppName) -> String {
    format!("app:{name}:state")
}

/// Expiry in whole seconds; sub-second TTLs round up so nothing is stored forever.
pub(crate) fn ttl_secs(ttl: std::time::Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn key_layout() {
        let name = AppName::from("svc-a");
        assert_eq!(lock_key(&LockKey::onboard(&name)), "lock:onboard:svc-a");
        assert_eq!(state_key(&name), "app:svc-a:state");
    }

    #[test]
    fn ttl_rounds_up() {
        assert_eq!(ttl_secs(Duration::from_secs(60)), 60);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_secs(Duration::ZERO), 1);
    }
}
