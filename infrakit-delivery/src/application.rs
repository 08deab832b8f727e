//! Wire shapes of the Argo CD `Application` resource.

use serde::{Deserialize, Serialize};

use infrakit_core::types::{ApplicationRecord, ControllerStatus};

pub const API_VERSION: &str = "argoproj.io/v1alpha1";
pub const KIND: &str = "Application";

/// Request body for create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: ApplicationSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub project: String,
    pub source: Source,
    pub destination: Destination,
    pub sync_policy: SyncPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    pub target_revision: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub server: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    pub automated: Automated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automated {
    pub prune: bool,
    pub self_heal: bool,
}

impl Application {
    /// Build the resource for `record`, always with automated prune + self-heal.
    pub fn for_record(
        record: &ApplicationRecord,
        argocd_namespace: &str,
        project: &str,
        server: String,
    ) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: Metadata {
                name: record.name.to_string(),
                namespace: argocd_namespace.to_string(),
            },
            spec: ApplicationSpec {
                project: project.to_string(),
                source: Source {
                    repo_url: record.git_repo.clone(),
                    target_revision: record.git_revision.clone(),
                    path: record.git_path.clone(),
                },
                destination: Destination {
                    server,
                    namespace: record.namespace.clone(),
                },
                sync_policy: SyncPolicy {
                    automated: Automated {
                        prune: true,
                        self_heal: true,
                    },
                },
            },
        }
    }
}

/// The subset of `GET /api/v1/applications/<name>` the status query reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationStatusResponse {
    #[serde(default)]
    pub status: StatusBlock,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusBlock {
    #[serde(default)]
    pub health: HealthBlock,
    #[serde(default)]
    pub sync: SyncBlock,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthBlock {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncBlock {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
}

impl From<ApplicationStatusResponse> for ControllerStatus {
    fn from(resp: ApplicationStatusResponse) -> Self {
        let StatusBlock { health, sync } = resp.status;
        ControllerStatus {
            health: health.status.unwrap_or_else(|| "Unknown".to_string()),
            sync_status: sync.status.unwrap_or_else(|| "Unknown".to_string()),
            revision: sync.revision,
        }
    }
}
