//! # infrakit-orchestrator
//!
//! The onboarding saga and its companions.
//!
//! Call [`Orchestrator::onboard`] to bring an application under GitOps
//! management, [`Orchestrator::sync`] to trigger reconciliation and
//! [`Orchestrator::status`] to read its best-known state.
//!
//! The orchestrator owns no state. Durable records live in the record store,
//! locks and snapshots in the cache; every collaborator is injected at
//! construction through [`Collaborators`].

pub mod error;
pub mod saga;
pub mod settings;
pub mod status;

pub use error::{Operation, OrchestratorError, SagaStep};
pub use saga::{Collaborators, Orchestrator};
pub use settings::{SagaSettings, Timeouts};
pub use status::StatusReport;
