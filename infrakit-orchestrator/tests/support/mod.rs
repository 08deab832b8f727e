//! Fakes for the saga's collaborators.
//!
//! The cache and record store are the real in-memory implementations; the
//! delivery controller and generator are scripted so tests can inject
//! failures and count calls.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use infrakit_core::error::{DeliveryError, ManifestError, RecordStoreError};
use infrakit_core::ports::{DeliveryController, ManifestGenerator, RecordStore};
use infrakit_core::types::{
    AppName, ApplicationRecord, ControllerStatus, OnboardRequest, RenderedManifest,
    ValidationOutcome,
};
use infrakit_orchestrator::{Collaborators, Orchestrator, SagaSettings};
use infrakit_store::{MemoryCache, MemoryRecordStore};

// ----- Record store -----

/// [`MemoryRecordStore`] that counts upserts.
#[derive(Default)]
pub struct CountingRecords {
    pub inner: MemoryRecordStore,
    pub upserts: AtomicUsize,
}

impl CountingRecords {
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingRecords {
    async fn upsert_application(
        &self,
        record: &ApplicationRecord,
    ) -> Result<(), RecordStoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert_application(record).await
    }

    async fn get_application(
        &self,
        name: &AppName,
    ) -> Result<Option<ApplicationRecord>, RecordStoreError> {
        self.inner.get_application(name).await
    }
}

// ----- Delivery controller -----

/// Records every remote call as `"<op> <name>"`. Destination lookups are
/// local and not recorded.
#[derive(Default)]
pub struct RecordingDelivery {
    pub calls: Mutex<Vec<String>>,
    pub fail_register: bool,
    pub fail_sync: bool,
    pub unknown_cluster: Option<String>,
}

impl RecordingDelivery {
    pub fn failing_register() -> Self {
        Self {
            fail_register: true,
            ..Self::default()
        }
    }

    pub fn failing_sync() -> Self {
        Self {
            fail_sync: true,
            ..Self::default()
        }
    }

    pub fn without_cluster(cluster: &str) -> Self {
        Self {
            unknown_cluster: Some(cluster.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DeliveryController for RecordingDelivery {
    async fn resolve_destination(&self, cluster: &str) -> Result<String, DeliveryError> {
        if self.unknown_cluster.as_deref() == Some(cluster) {
            return Err(DeliveryError::UnknownCluster(cluster.to_string()));
        }
        Ok(format!("https://{cluster}.k8s.example.com:6443"))
    }

    async fn create_or_update_application(
        &self,
        record: &ApplicationRecord,
    ) -> Result<(), DeliveryError> {
        self.record(format!("register {} {}", record.name, record.cluster));
        if self.fail_register {
            return Err(DeliveryError::Http {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }

    async fn sync_application(&self, name: &AppName) -> Result<(), DeliveryError> {
        self.record(format!("sync {name}"));
        if self.fail_sync {
            return Err(DeliveryError::Http {
                status: 404,
                body: "application not found".to_string(),
            });
        }
        Ok(())
    }

    async fn get_application_status(
        &self,
        name: &AppName,
    ) -> Result<ControllerStatus, DeliveryError> {
        self.record(format!("status {name}"));
        Ok(ControllerStatus {
            health: "Healthy".to_string(),
            sync_status: "Synced".to_string(),
            revision: Some("abc123".to_string()),
        })
    }
}

// ----- Manifest generator -----

/// Generator whose verdicts are fixed at construction.
///
/// With a gate, `generate` signals `entered` and then parks until the gate
/// is notified, which holds the onboard lock for as long as a test needs.
pub struct ScriptedManifests {
    pub verdict: ValidationOutcome,
    pub rejection: Option<String>,
    pub gate: Option<Arc<Notify>>,
    pub entered: Notify,
    pub generated: AtomicUsize,
    pub validated: AtomicUsize,
}

impl ScriptedManifests {
    pub fn passing() -> Self {
        Self {
            verdict: ValidationOutcome {
                valid: true,
                error: None,
            },
            rejection: None,
            gate: None,
            entered: Notify::new(),
            generated: AtomicUsize::new(0),
            validated: AtomicUsize::new(0),
        }
    }

    pub fn invalid(error: &str) -> Self {
        Self {
            verdict: ValidationOutcome {
                valid: false,
                error: Some(error.to_string()),
            },
            ..Self::passing()
        }
    }

    pub fn rejecting(error: &str) -> Self {
        Self {
            rejection: Some(error.to_string()),
            ..Self::passing()
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::passing()
        }
    }

    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }

    pub fn validated(&self) -> usize {
        self.validated.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestGenerator for ScriptedManifests {
    async fn generate(
        &self,
        name: &AppName,
        chart: &str,
        _values: &serde_json::Value,
    ) -> Result<RenderedManifest, ManifestError> {
        self.generated.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            self.entered.notify_one();
            gate.notified().await;
        }
        if let Some(reason) = &self.rejection {
            return Err(ManifestError::Rejected(reason.clone()));
        }
        Ok(RenderedManifest {
            manifest: format!("# {name} from {chart}\nkind: Deployment\n"),
        })
    }

    async fn validate(
        &self,
        _manifest: &RenderedManifest,
        _kubeconfig: Option<&str>,
    ) -> Result<ValidationOutcome, ManifestError> {
        self.validated.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict.clone())
    }
}

// ----- Harness -----

pub struct Harness {
    pub cache: Arc<MemoryCache>,
    pub records: Arc<CountingRecords>,
    pub delivery: Arc<RecordingDelivery>,
    pub manifests: Arc<ScriptedManifests>,
}

impl Harness {
    pub fn new(delivery: RecordingDelivery, manifests: ScriptedManifests) -> Self {
        Self {
            cache: Arc::new(MemoryCache::new()),
            records: Arc::new(CountingRecords::default()),
            delivery: Arc::new(delivery),
            manifests: Arc::new(manifests),
        }
    }

    pub fn passing() -> Self {
        Self::new(RecordingDelivery::default(), ScriptedManifests::passing())
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            Collaborators {
                cache: self.cache.clone(),
                records: self.records.clone(),
                delivery: self.delivery.clone(),
                manifests: self.manifests.clone(),
            },
            SagaSettings::default(),
        )
    }
}

pub fn request(name: &str, cluster: &str) -> OnboardRequest {
    let mut request = OnboardRequest::new(name, cluster, "charts/svc", "git@example.com:infra.git");
    request.path = format!("apps/{name}");
    request
}
