//! Domain types for onboarded applications.
//!
//! All types are serializable via serde; snapshots travel through the cache
//! as JSON, records are what the durable store holds.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// The unique natural key of an onboarded application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppName(pub String);

impl AppName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AppName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AppName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Operation-scoped mutual-exclusion key, e.g. `onboard:svc-a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    pub fn onboard(name: &AppName) -> Self {
        Self(format!("onboard:{name}"))
    }

    pub fn sync(name: &AppName) -> Self {
        Self(format!("sync:{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Durable record
// ---------------------------------------------------------------------------

/// A row of the `applications` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub name: AppName,
    pub cluster: String,
    pub namespace: String,
    pub helm_chart: String,
    pub git_repo: String,
    pub git_revision: String,
    pub git_path: String,
    /// Assigned by the store on every upsert; callers' values are ignored.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ephemeral state
// ---------------------------------------------------------------------------

/// Lifecycle status published to the cache at saga checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Provisioning,
    Active,
    Syncing,
    Failed,
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppStatus::Provisioning => write!(f, "provisioning"),
            AppStatus::Active => write!(f, "active"),
            AppStatus::Syncing => write!(f, "syncing"),
            AppStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Point-in-time state of an application, kept in the cache with a TTL.
///
/// Writes replace the whole snapshot; there is no field-level merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub status: AppStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StateSnapshot {
    pub fn provisioning(cluster: impl Into<String>) -> Self {
        Self {
            status: AppStatus::Provisioning,
            cluster: Some(cluster.into()),
            last_operation: Some("onboard".to_string()),
            error: None,
        }
    }

    pub fn active(cluster: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            status: AppStatus::Active,
            cluster: Some(cluster.into()),
            last_operation: Some(operation.into()),
            error: None,
        }
    }

    pub fn syncing() -> Self {
        Self {
            status: AppStatus::Syncing,
            cluster: None,
            last_operation: Some("sync".to_string()),
            error: None,
        }
    }

    pub fn failed(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: AppStatus::Failed,
            cluster: None,
            last_operation: Some(operation.into()),
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Operation inputs and collaborator outputs
// ---------------------------------------------------------------------------

/// Everything `onboard` needs to bring an application under GitOps management.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardRequest {
    pub name: AppName,
    pub cluster: String,
    pub namespace: String,
    pub chart: String,
    pub repo: String,
    pub path: String,
    pub revision: String,
    /// Helm values; `Null` when none were given.
    pub values: serde_json::Value,
    pub kubeconfig: Option<String>,
}

impl OnboardRequest {
    pub const DEFAULT_NAMESPACE: &'static str = "default";
    pub const DEFAULT_PATH: &'static str = ".";
    pub const DEFAULT_REVISION: &'static str = "main";

    /// A request with the defaults for namespace, path, revision and values.
    pub fn new(
        name: impl Into<AppName>,
        cluster: impl Into<String>,
        chart: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cluster: cluster.into(),
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            chart: chart.into(),
            repo: repo.into(),
            path: Self::DEFAULT_PATH.to_string(),
            revision: Self::DEFAULT_REVISION.to_string(),
            values: serde_json::Value::Null,
            kubeconfig: None,
        }
    }

    /// The durable record this request upserts. `updated_at` is a placeholder;
    /// the store assigns the real value.
    pub fn to_record(&self) -> ApplicationRecord {
        ApplicationRecord {
            name: self.name.clone(),
            cluster: self.cluster.clone(),
            namespace: self.namespace.clone(),
            helm_chart: self.chart.clone(),
            git_repo: self.repo.clone(),
            git_revision: self.revision.clone(),
            git_path: self.path.clone(),
            updated_at: Utc::now(),
        }
    }
}

/// Output of the generator's render step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedManifest {
    pub manifest: String,
}

/// Semantic validation verdict. `valid == false` is an application-level
/// failure, never a system fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub error: Option<String>,
}

/// Live health reported by the delivery controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerStatus {
    pub health: String,
    pub sync_status: String,
    pub revision: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
