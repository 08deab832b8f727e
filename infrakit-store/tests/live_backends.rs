//! Contract checks against real Redis / PostgreSQL.
//!
//! Each test returns early unless its backend URL is exported:
//! `INFRAKIT_TEST_REDIS_URL`, `INFRAKIT_TEST_DATABASE_URL`.

use std::time::Duration;

use infrakit_core::ports::{RecordStore, StateCache};
use infrakit_core::types::{AppName, AppStatus, LockKey, OnboardRequest, StateSnapshot};
use infrakit_store::{PgRecordStore, RedisCache};

fn env_url(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn unique_name(prefix: &str) -> AppName {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    AppName::from(format!("{prefix}-{nanos}"))
}

#[tokio::test]
async fn redis_lock_is_exclusive_and_expires() {
    let Some(url) = env_url("INFRAKIT_TEST_REDIS_URL") else {
        return;
    };
    let cache = RedisCache::connect(&url).await.expect("connect");
    let key = LockKey::onboard(&unique_name("lock"));

    assert!(cache.acquire(&key, Duration::from_secs(1)).await.expect("first"));
    assert!(!cache.acquire(&key, Duration::from_secs(1)).await.expect("second"));

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(cache.acquire(&key, Duration::from_secs(1)).await.expect("third"));
    cache.release(&key).await.expect("release");
    cache.release(&key).await.expect("release again is a no-op");
}

#[tokio::test]
async fn redis_state_roundtrips_whole_snapshot() {
    let Some(url) = env_url("INFRAKIT_TEST_REDIS_URL") else {
        return;
    };
    let cache = RedisCache::connect(&url).await.expect("connect");
    let name = unique_name("state");

    assert!(cache.get_state(&name).await.expect("get").is_none());
    cache
        .put_state(&name, &StateSnapshot::failed("onboard", "bad values"), Duration::from_secs(30))
        .await
        .expect("put");
    let snap = cache.get_state(&name).await.expect("get").expect("present");
    assert_eq!(snap.status, AppStatus::Failed);
    assert_eq!(snap.error.as_deref(), Some("bad values"));
}

#[tokio::test]
async fn postgres_upsert_keeps_one_row_with_latest_values() {
    let Some(url) = env_url("INFRAKIT_TEST_DATABASE_URL") else {
        return;
    };
    let store = PgRecordStore::connect(&url, 2).await.expect("connect");
    store.ensure_schema().await.expect("schema");

    let name = unique_name("svc");
    let mut request = OnboardRequest::new(name.clone(), "staging", "charts/svc", "git@example.com:infra.git");
    store
        .upsert_application(&request.to_record())
        .await
        .expect("first upsert");
    let first = store.get_application(&name).await.expect("get").expect("row");

    request.cluster = "prod".to_string();
    store
        .upsert_application(&request.to_record())
        .await
        .expect("second upsert");
    let second = store.get_application(&name).await.expect("get").expect("row");

    assert_eq!(second.cluster, "prod");
    assert!(second.updated_at >= first.updated_at);
    assert!(store
        .get_application(&unique_name("absent"))
        .await
        .expect("get")
        .is_none());
}
