//! Best-known state of an application.

use serde::Serialize;

use infrakit_core::types::{AppName, ApplicationRecord, AppStatus, StateSnapshot};

/// Result of [`Orchestrator::status`](crate::Orchestrator::status).
///
/// The cached snapshot is authoritative while it lives; after it expires the
/// durable record is the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum StatusReport {
    Live { name: AppName, snapshot: StateSnapshot },
    Recorded { record: ApplicationRecord },
    Unknown { name: AppName },
}

impl StatusReport {
    pub fn name(&self) -> &AppName {
        match self {
            StatusReport::Live { name, .. } | StatusReport::Unknown { name } => name,
            StatusReport::Recorded { record } => &record.name,
        }
    }

    /// Status from the snapshot, or `None` when only the record (or nothing) is known.
    pub fn status(&self) -> Option<AppStatus> {
        match self {
            StatusReport::Live { snapshot, .. } => Some(snapshot.status),
            _ => None,
        }
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match self {
            StatusReport::Live { name, snapshot } => {
                let mut line = format!("{name}: {}", snapshot.status);
                if let Some(cluster) = &snapshot.cluster {
                    line.push_str(&format!(" on {cluster}"));
                }
                if let Some(op) = &snapshot.last_operation {
                    line.push_str(&format!(" (last operation: {op})"));
                }
                if let Some(error) = &snapshot.error {
                    line.push_str(&format!(": {error}"));
                }
                line
            }
            StatusReport::Recorded { record } => format!(
                "{}: no recent state; recorded on {} in namespace {} at {} (updated {})",
                record.name,
                record.cluster,
                record.namespace,
                record.git_revision,
                record.updated_at.to_rfc3339(),
            ),
            StatusReport::Unknown { name } => format!("{name}: unknown application"),
        }
    }
}
