//! InfraKit core library: domain types, configuration, collaborator ports, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes, application records and state snapshots
//! - [`config`]: YAML configuration loading and validation
//! - [`ports`]: async traits implemented by the collaborator clients
//! - [`error`]: [`ConfigError`] and the per-collaborator error enums

pub mod config;
pub mod error;
pub mod ports;
pub mod types;

pub use config::Config;
pub use error::{CacheError, ConfigError, DeliveryError, ManifestError, RecordStoreError};
pub use ports::{DeliveryController, ManifestGenerator, RecordStore, StateCache};
pub use types::{
    AppName, AppStatus, ApplicationRecord, ControllerStatus, LockKey, OnboardRequest,
    RenderedManifest, StateSnapshot, ValidationOutcome,
};
