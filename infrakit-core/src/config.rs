//! YAML configuration, read once at process start.
//!
//! # Location
//!
//! ```text
//! $INFRAKIT_CONFIG                  (if set)
//! <home>/.infrakit/config.yaml      (otherwise)
//! ```
//!
//! # API pattern
//!
//! - `load_at(path)`: explicit file; used in tests with `TempDir`
//! - `load()`: resolves the location as above, delegates to `load_at`
//!
//! Missing required sections are fatal; optional sections fall back to defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable overriding the config location.
pub const CONFIG_ENV: &str = "INFRAKIT_CONFIG";

// ---------------------------------------------------------------------------
// 1. Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgoCdConfig {
    pub api_url: String,
    pub username: String,
    pub password: String,
    /// Namespace the Argo CD `Application` objects live in.
    pub namespace: String,
    #[serde(default = "default_project")]
    pub project: String,
    /// Cluster name → API server URL used as `spec.destination.server`.
    #[serde(default)]
    pub clusters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoServiceConfig {
    pub path: PathBuf,
    /// Arguments placed before the command name, e.g. a script for an interpreter.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Lock and snapshot lifetimes, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    pub onboard_ttl_secs: u64,
    pub sync_ttl_secs: u64,
    pub state_ttl_secs: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            onboard_ttl_secs: 300,
            sync_ttl_secs: 60,
            state_ttl_secs: 3600,
        }
    }
}

impl LockSettings {
    pub fn onboard_ttl(&self) -> Duration {
        Duration::from_secs(self.onboard_ttl_secs)
    }

    pub fn sync_ttl(&self) -> Duration {
        Duration::from_secs(self.sync_ttl_secs)
    }

    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state_ttl_secs)
    }
}

/// Upper bounds for each class of external call, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub cache_secs: u64,
    pub records_secs: u64,
    pub controller_secs: u64,
    pub generator_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            cache_secs: 5,
            records_secs: 10,
            controller_secs: 30,
            generator_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Document
// ---------------------------------------------------------------------------

/// The validated configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub redis: RedisConfig,
    pub postgresql: PostgresConfig,
    pub argocd: ArgoCdConfig,
    pub go_service: GoServiceConfig,
    pub locks: LockSettings,
    pub timeouts: TimeoutSettings,
}

/// On-disk shape; every required section is optional here so that a missing
/// one is reported by name rather than as a generic parse error.
#[derive(Debug, Deserialize)]
struct RawConfig {
    redis: Option<RedisConfig>,
    postgresql: Option<PostgresConfig>,
    argocd: Option<ArgoCdConfig>,
    go_service: Option<GoServiceConfig>,
    #[serde(default)]
    locks: LockSettings,
    #[serde(default)]
    timeouts: TimeoutSettings,
}

impl Config {
    /// Parse and validate a YAML document. `path` is only used for error context.
    pub fn from_yaml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = Config {
            redis: raw.redis.ok_or(ConfigError::MissingSection("redis"))?,
            postgresql: raw
                .postgresql
                .ok_or(ConfigError::MissingSection("postgresql"))?,
            argocd: raw.argocd.ok_or(ConfigError::MissingSection("argocd"))?,
            go_service: raw
                .go_service
                .ok_or(ConfigError::MissingSection("go_service"))?,
            locks: raw.locks,
            timeouts: raw.timeouts,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let locks = &self.locks;
        for (field, secs) in [
            ("locks.onboard_ttl_secs", locks.onboard_ttl_secs),
            ("locks.sync_ttl_secs", locks.sync_ttl_secs),
            ("locks.state_ttl_secs", locks.state_ttl_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if locks.sync_ttl_secs >= locks.onboard_ttl_secs {
            return Err(ConfigError::Invalid {
                field: "locks.sync_ttl_secs",
                reason: format!(
                    "sync lock ({}s) must be shorter than the onboarding lock ({}s)",
                    locks.sync_ttl_secs, locks.onboard_ttl_secs
                ),
            });
        }

        let timeouts = &self.timeouts;
        for (field, secs) in [
            ("timeouts.cache_secs", timeouts.cache_secs),
            ("timeouts.records_secs", timeouts.records_secs),
            ("timeouts.controller_secs", timeouts.controller_secs),
            ("timeouts.generator_secs", timeouts.generator_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.argocd.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "argocd.apiUrl",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// `<home>/.infrakit/config.yaml`. Pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".infrakit").join("config.yaml")
}

/// `$INFRAKIT_CONFIG` if set and non-empty, else the default under `$HOME`.
pub fn resolve_path() -> Result<PathBuf, ConfigError> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => dirs::home_dir()
            .map(|home| default_path_at(&home))
            .ok_or(ConfigError::HomeNotFound),
    }
}

/// Load and validate the config file at `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse`
/// (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Config::from_yaml_str(&contents, path)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&resolve_path()?)
}

fn default_project() -> String {
    "default".to_string()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
