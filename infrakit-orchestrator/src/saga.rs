//! The onboard and sync sagas.
//!
//! # Onboard
//!
//! 1. take `onboard:<name>` (or fail with `InProgress`)
//! 2. publish `provisioning`
//! 3. generate the manifest
//! 4. validate it; a negative verdict aborts before any durable write
//! 5. resolve the destination cluster; an unknown one also aborts
//! 6. upsert the record
//! 7. register with the delivery controller
//! 8. publish `active`
//!
//! Any failure after step 1 publishes a `failed` snapshot. The lock is
//! released on every path once it has been taken.
//!
//! There is no compensation. Upsert and registration are both idempotent, so
//! re-running onboard after a partial failure converges.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use infrakit_core::ports::{DeliveryController, ManifestGenerator, RecordStore, StateCache};
use infrakit_core::types::{AppName, ControllerStatus, LockKey, OnboardRequest, StateSnapshot};

use crate::error::{Operation, OrchestratorError, SagaStep};
use crate::settings::SagaSettings;
use crate::status::StatusReport;

/// Runs `fut` under `limit`, converting expiry into a step-tagged timeout.
async fn bounded<T, E, F>(step: SagaStep, limit: Duration, fut: F) -> Result<T, OrchestratorError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<OrchestratorError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(step = %step, after_secs = limit.as_secs(), "step timed out");
            Err(OrchestratorError::Timeout { step, after: limit })
        }
    }
}

/// The four injected collaborators.
#[derive(Clone)]
pub struct Collaborators {
    pub cache: Arc<dyn StateCache>,
    pub records: Arc<dyn RecordStore>,
    pub delivery: Arc<dyn DeliveryController>,
    pub manifests: Arc<dyn ManifestGenerator>,
}

/// Stateless coordinator; safe to share across tasks.
#[derive(Clone)]
pub struct Orchestrator {
    deps: Collaborators,
    settings: SagaSettings,
}

impl Orchestrator {
    pub fn new(deps: Collaborators, settings: SagaSettings) -> Self {
        Self { deps, settings }
    }

    pub fn settings(&self) -> &SagaSettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub async fn onboard(&self, request: &OnboardRequest) -> Result<(), OrchestratorError> {
        self.with_lock(Operation::Onboard, &request.name, self.run_onboard(request))
            .await
    }

    /// Triggers reconciliation and records `syncing`. Does not wait for the
    /// controller to finish.
    pub async fn sync(&self, name: &AppName) -> Result<(), OrchestratorError> {
        self.with_lock(Operation::Sync, name, self.run_sync(name))
            .await
    }

    /// Snapshot if one is cached, else the durable record, else `Unknown`.
    ///
    /// A failing cache degrades to the record lookup.
    pub async fn status(&self, name: &AppName) -> Result<StatusReport, OrchestratorError> {
        match bounded(
            SagaStep::ReadState,
            self.settings.timeouts.cache,
            self.deps.cache.get_state(name),
        )
        .await
        {
            Ok(Some(snapshot)) => {
                return Ok(StatusReport::Live {
                    name: name.clone(),
                    snapshot,
                })
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(app = %name, error = %err, "cached state unavailable; using record");
            }
        }

        let record = bounded(
            SagaStep::ReadRecord,
            self.settings.timeouts.records,
            self.deps.records.get_application(name),
        )
        .await?;
        Ok(match record {
            Some(record) => StatusReport::Recorded { record },
            None => StatusReport::Unknown { name: name.clone() },
        })
    }

    /// Health and sync state straight from the delivery controller.
    pub async fn live_status(&self, name: &AppName) -> Result<ControllerStatus, OrchestratorError> {
        bounded(
            SagaStep::ReadController,
            self.settings.timeouts.controller,
            self.deps.delivery.get_application_status(name),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Saga bodies, run with the lock held
    // -----------------------------------------------------------------------

    async fn run_onboard(&self, request: &OnboardRequest) -> Result<(), OrchestratorError> {
        let name = &request.name;
        self.publish(name, StateSnapshot::provisioning(&request.cluster))
            .await?;

        let limit = self.settings.timeouts.generator;
        let rendered = bounded(
            SagaStep::Generate,
            limit,
            self.deps
                .manifests
                .generate(name, &request.chart, &request.values),
        )
        .await?;
        tracing::debug!(app = %name, bytes = rendered.manifest.len(), "manifest rendered");

        let verdict = bounded(
            SagaStep::Validate,
            limit,
            self.deps
                .manifests
                .validate(&rendered, request.kubeconfig.as_deref()),
        )
        .await?;
        if !verdict.valid {
            return Err(OrchestratorError::Validation {
                message: verdict
                    .error
                    .unwrap_or_else(|| "manifest rejected without detail".to_string()),
            });
        }

        let server = bounded(
            SagaStep::ResolveDestination,
            self.settings.timeouts.controller,
            self.deps.delivery.resolve_destination(&request.cluster),
        )
        .await?;
        tracing::debug!(app = %name, cluster = %request.cluster, server = %server, "destination resolved");

        let record = request.to_record();
        bounded(
            SagaStep::Persist,
            self.settings.timeouts.records,
            self.deps.records.upsert_application(&record),
        )
        .await?;

        bounded(
            SagaStep::Register,
            self.settings.timeouts.controller,
            self.deps.delivery.create_or_update_application(&record),
        )
        .await?;

        self.publish(name, StateSnapshot::active(&request.cluster, "onboard"))
            .await?;
        tracing::info!(app = %name, cluster = %request.cluster, "application onboarded");
        Ok(())
    }

    async fn run_sync(&self, name: &AppName) -> Result<(), OrchestratorError> {
        bounded(
            SagaStep::TriggerSync,
            self.settings.timeouts.controller,
            self.deps.delivery.sync_application(name),
        )
        .await?;
        self.publish(name, StateSnapshot::syncing()).await?;
        tracing::info!(app = %name, "sync triggered");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lock and snapshot plumbing
    // -----------------------------------------------------------------------

    /// Takes the operation's lock, runs `body`, releases the lock.
    ///
    /// Onboard failures are cached as a `failed` snapshot; sync failures are
    /// only returned, leaving whatever snapshot was there before.
    async fn with_lock<F>(
        &self,
        operation: Operation,
        name: &AppName,
        body: F,
    ) -> Result<(), OrchestratorError>
    where
        F: Future<Output = Result<(), OrchestratorError>>,
    {
        let (key, ttl) = match operation {
            Operation::Onboard => (LockKey::onboard(name), self.settings.onboard_lock_ttl),
            Operation::Sync => (LockKey::sync(name), self.settings.sync_lock_ttl),
        };

        let acquired = bounded(
            SagaStep::AcquireLock,
            self.settings.timeouts.cache,
            self.deps.cache.acquire(&key, ttl),
        )
        .await?;
        if !acquired {
            tracing::info!(app = %name, lock = %key, "lock held elsewhere");
            return Err(OrchestratorError::InProgress {
                operation,
                name: name.clone(),
            });
        }

        let started = Instant::now();
        tracing::info!(app = %name, lock = %key, "{operation} started");
        let outcome = body.await;

        if let Err(err) = &outcome {
            if err.is_system_fault() {
                tracing::error!(app = %name, error = %err, "{operation} failed");
            } else {
                tracing::warn!(app = %name, error = %err, "{operation} rejected");
            }
            if operation == Operation::Onboard {
                let snapshot = StateSnapshot::failed(operation.as_str(), err.to_string());
                if let Err(publish_err) = self.publish(name, snapshot).await {
                    tracing::warn!(app = %name, error = %publish_err, "could not publish failed state");
                }
            }
        }

        let held = started.elapsed();
        if held > ttl {
            // The lock may have been taken by someone else in the meantime;
            // the release below can delete their lock.
            tracing::warn!(
                app = %name,
                lock = %key,
                held_secs = held.as_secs(),
                ttl_secs = ttl.as_secs(),
                "{operation} outlived its lock"
            );
        }

        if let Err(err) = bounded(
            SagaStep::ReleaseLock,
            self.settings.timeouts.cache,
            self.deps.cache.release(&key),
        )
        .await
        {
            tracing::warn!(app = %name, lock = %key, error = %err, "lock release failed; it expires on its TTL");
        }

        outcome
    }

    async fn publish(&self, name: &AppName, snapshot: StateSnapshot) -> Result<(), OrchestratorError> {
        tracing::debug!(app = %name, status = %snapshot.status, "publishing state");
        bounded(
            SagaStep::PublishState,
            self.settings.timeouts.cache,
            self.deps
                .cache
                .put_state(name, &snapshot, self.settings.state_ttl),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn bounded_tags_expiry_with_the_step() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), OrchestratorError>(())
        };
        let err = bounded(SagaStep::Generate, Duration::from_secs(5), slow)
            .await
            .unwrap_err();
        match err {
            OrchestratorError::Timeout { step, after } => {
                assert_eq!(step, SagaStep::Generate);
                assert_eq!(after, Duration::from_secs(5));
            }
            other => panic!("expected Timeout, got: {other}"),
        }
    }

    #[tokio::test]
    async fn bounded_passes_results_through() {
        let ok = bounded(SagaStep::Persist, Duration::from_secs(1), async {
            Ok::<u8, OrchestratorError>(7)
        })
        .await
        .expect("ok");
        assert_eq!(ok, 7);
    }
}
