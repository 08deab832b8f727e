//! `infrakit status <app>`: cached state, durable record, or live controller view.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use infrakit_core::types::{AppName, AppStatus, ControllerStatus};
use infrakit_orchestrator::StatusReport;

use crate::context::{self, Schema};

/// Arguments for `infrakit status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Name of the application.
    pub name: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Also query the delivery controller for health and sync state.
    #[arg(long)]
    pub live: bool,
}

#[derive(Serialize)]
struct StatusJson<'a> {
    #[serde(flatten)]
    report: &'a StatusReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    live: Option<&'a ControllerStatus>,
}

#[derive(Tabled)]
struct DetailRow {
    #[tabled(rename = "field")]
    field: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

impl StatusArgs {
    /// Status is read-only, DDL included.
    const SCHEMA: Schema = Schema::AsIs;

    pub fn run(self) -> Result<()> {
        let config = context::load_config()?;
        let name = AppName::from(self.name);
        let live = self.live;

        let (report, controller) = context::block_on(async {
            let orchestrator = context::connect(&config, Self::SCHEMA).await?;
            let report = orchestrator
                .status(&name)
                .await
                .with_context(|| format!("status of '{name}' unavailable"))?;
            let controller = if live {
                Some(
                    orchestrator
                        .live_status(&name)
                        .await
                        .with_context(|| format!("live status of '{name}' unavailable"))?,
                )
            } else {
                None
            };
            Ok::<_, anyhow::Error>((report, controller))
        })?;

        if self.json {
            let payload = StatusJson {
                report: &report,
                live: controller.as_ref(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        println!("{} {}", indicator(&report), report.summary());
        let rows = detail_rows(&report, controller.as_ref());
        if !rows.is_empty() {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }
        Ok(())
    }
}

fn indicator(report: &StatusReport) -> String {
    match report {
        StatusReport::Live { snapshot, .. } => match snapshot.status {
            AppStatus::Active => "■".green().bold().to_string(),
            AppStatus::Provisioning | AppStatus::Syncing => "■".yellow().bold().to_string(),
            AppStatus::Failed => "■".red().bold().to_string(),
        },
        StatusReport::Recorded { .. } => "■".blue().bold().to_string(),
        StatusReport::Unknown { .. } => "■".bright_black().bold().to_string(),
    }
}

fn detail_rows(report: &StatusReport, controller: Option<&ControllerStatus>) -> Vec<DetailRow> {
    let mut rows = Vec::new();
    match report {
        StatusReport::Live { snapshot, .. } => {
            rows.push(DetailRow {
                field: "status",
                value: snapshot.status.to_string(),
            });
            if let Some(cluster) = &snapshot.cluster {
                rows.push(DetailRow {
                    field: "cluster",
                    value: cluster.clone(),
                });
            }
            if let Some(op) = &snapshot.last_operation {
                rows.push(DetailRow {
                    field: "last operation",
                    value: op.clone(),
                });
            }
            if let Some(error) = &snapshot.error {
                rows.push(DetailRow {
                    field: "error",
                    value: error.clone(),
                });
            }
        }
        StatusReport::Recorded { record } => {
            for (field, value) in [
                ("cluster", &record.cluster),
                ("namespace", &record.namespace),
                ("chart", &record.helm_chart),
                ("repo", &record.git_repo),
                ("path", &record.git_path),
                ("revision", &record.git_revision),
            ] {
                rows.push(DetailRow {
                    field,
                    value: value.clone(),
                });
            }
            rows.push(DetailRow {
                field: "updated",
                value: record.updated_at.to_rfc3339(),
            });
        }
        StatusReport::Unknown { .. } => {}
    }

    if let Some(live) = controller {
        rows.push(DetailRow {
            field: "health",
            value: live.health.clone(),
        });
        rows.push(DetailRow {
            field: "sync",
            value: live.sync_status.clone(),
        });
        rows.push(DetailRow {
            field: "revision",
            value: live.revision.clone().unwrap_or_else(|| "-".to_string()),
        });
    }
    rows
}
