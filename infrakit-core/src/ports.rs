//! Narrow interfaces to the four external collaborators.
//!
//! The orchestrator depends only on these traits; concrete clients live in
//! `infrakit-store`, `infrakit-delivery` and `infrakit-manifest`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CacheError, DeliveryError, ManifestError, RecordStoreError};
use crate::types::{
    AppName, ApplicationRecord, ControllerStatus, LockKey, RenderedManifest, StateSnapshot,
    ValidationOutcome,
};

/// Distributed lock primitives and the TTL'd state cache.
#[async_trait]
pub trait StateCache: Send + Sync {
    /// Atomic set-if-absent with expiry. `true` iff this call took the lock.
    async fn acquire(&self, key: &LockKey, ttl: Duration) -> Result<bool, CacheError>;

    /// Unconditional delete; releasing a lock nobody holds is a no-op.
    async fn release(&self, key: &LockKey) -> Result<(), CacheError>;

    /// Overwrite the whole snapshot for `name`, expiring after `ttl`.
    async fn put_state(
        &self,
        name: &AppName,
        snapshot: &StateSnapshot,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn get_state(&self, name: &AppName) -> Result<Option<StateSnapshot>, CacheError>;
}

/// Durable application records keyed by name.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert-or-update keyed by `record.name`; always refreshes `updated_at`.
    async fn upsert_application(&self, record: &ApplicationRecord)
        -> Result<(), RecordStoreError>;

    async fn get_application(
        &self,
        name: &AppName,
    ) -> Result<Option<ApplicationRecord>, RecordStoreError>;
}

/// The continuous-delivery controller.
#[async_trait]
pub trait DeliveryController: Send + Sync {
    /// API server a cluster name deploys to. Touches nothing remote-side, so
    /// the orchestrator calls it before any durable write.
    async fn resolve_destination(&self, cluster: &str) -> Result<String, DeliveryError>;

    /// Idempotent registration with automated prune + self-heal.
    async fn create_or_update_application(
        &self,
        record: &ApplicationRecord,
    ) -> Result<(), DeliveryError>;

    /// Trigger reconciliation; returns without waiting for it to finish.
    async fn sync_application(&self, name: &AppName) -> Result<(), DeliveryError>;

    async fn get_application_status(&self, name: &AppName)
        -> Result<ControllerStatus, DeliveryError>;
}

/// The external render/validate tool.
#[async_trait]
pub trait ManifestGenerator: Send + Sync {
    async fn generate(
        &self,
        name: &AppName,
        chart: &str,
        values: &serde_json::Value,
    ) -> Result<RenderedManifest, ManifestError>;

    /// `kubeconfig` describes the target cluster; `None` uses the tool's default.
    async fn validate(
        &self,
        manifest: &RenderedManifest,
        kubeconfig: Option<&str>,
    ) -> Result<ValidationOutcome, ManifestError>;
}
