use std::time::Duration;

use infrakit_core::config::{Config, LockSettings, TimeoutSettings};

/// Upper bound for each class of external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub cache: Duration,
    pub records: Duration,
    pub controller: Duration,
    pub generator: Duration,
}

impl From<TimeoutSettings> for Timeouts {
    fn from(t: TimeoutSettings) -> Self {
        Self {
            cache: Duration::from_secs(t.cache_secs),
            records: Duration::from_secs(t.records_secs),
            controller: Duration::from_secs(t.controller_secs),
            generator: Duration::from_secs(t.generator_secs),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        TimeoutSettings::default().into()
    }
}

/// Lock lifetimes and call bounds for one [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SagaSettings {
    pub onboard_lock_ttl: Duration,
    pub sync_lock_ttl: Duration,
    pub state_ttl: Duration,
    pub timeouts: Timeouts,
}

impl SagaSettings {
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.locks, config.timeouts)
    }

    pub fn new(locks: LockSettings, timeouts: TimeoutSettings) -> Self {
        Self {
            onboard_lock_ttl: locks.onboard_ttl(),
            sync_lock_ttl: locks.sync_ttl(),
            state_ttl: locks.state_ttl(),
            timeouts: timeouts.into(),
        }
    }
}

impl Default for SagaSettings {
    fn default() -> Self {
        Self::new(LockSettings::default(), TimeoutSettings::default())
    }
}
