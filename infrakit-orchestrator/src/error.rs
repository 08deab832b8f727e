//! Error taxonomy of the saga.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use infrakit_core::error::{CacheError, DeliveryError, ManifestError, RecordStoreError};
use infrakit_core::types::AppName;

/// Lock-guarded operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Onboard,
    Sync,
}

impl Operation {
    /// Name recorded as a snapshot's `last_operation`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Onboard => "onboard",
            Operation::Sync => "sync",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Onboard => write!(f, "onboarding"),
            Operation::Sync => write!(f, "sync"),
        }
    }
}

/// Each external call the orchestrator makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStep {
    AcquireLock,
    ReleaseLock,
    PublishState,
    Generate,
    Validate,
    Persist,
    Register,
    TriggerSync,
    ReadState,
    ReadRecord,
    ReadController,
    ResolveDestination,
}

impl fmt::Display for SagaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SagaStep::AcquireLock => "lock acquisition",
            SagaStep::ReleaseLock => "lock release",
            SagaStep::PublishState => "state publication",
            SagaStep::Generate => "manifest generation",
            SagaStep::Validate => "manifest validation",
            SagaStep::Persist => "record upsert",
            SagaStep::Register => "controller registration",
            SagaStep::TriggerSync => "sync trigger",
            SagaStep::ReadState => "cached state read",
            SagaStep::ReadRecord => "record read",
            SagaStep::ReadController => "controller status read",
            SagaStep::ResolveDestination => "destination resolution",
        };
        f.write_str(label)
    }
}

/// All errors that can end an orchestrator call.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Another caller holds the lock; retry later.
    #[error("{operation} already in progress for '{name}'")]
    InProgress { operation: Operation, name: AppName },

    /// The request is invalid: a rejected chart/values combination or an
    /// unresolvable cluster. Durable state is untouched.
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("manifest generator failed: {0}")]
    Generator(#[source] ManifestError),

    #[error(transparent)]
    Records(#[from] RecordStoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Delivery(DeliveryError),

    #[error("{step} timed out after {}s", after.as_secs_f64())]
    Timeout { step: SagaStep, after: Duration },
}

impl OrchestratorError {
    /// True when an external collaborator or its environment failed, as
    /// opposed to contention or invalid input.
    pub fn is_system_fault(&self) -> bool {
        !matches!(
            self,
            OrchestratorError::InProgress { .. } | OrchestratorError::Validation { .. }
        )
    }
}

/// A generator refusal is the user's input being wrong, not the tool.
impl From<ManifestError> for OrchestratorError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::Rejected(message) => OrchestratorError::Validation { message },
            other => OrchestratorError::Generator(other),
        }
    }
}

/// A cluster the controller has no server for is a bad request.
impl From<DeliveryError> for OrchestratorError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::UnknownCluster(_) => OrchestratorError::Validation {
                message: err.to_string(),
            },
            other => OrchestratorError::Delivery(other),
        }
    }
}
