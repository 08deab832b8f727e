//! `infrakit onboard --name <app> --cluster <cluster> --chart <chart> --repo <url> ...`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use infrakit_core::types::{AppName, OnboardRequest};

use crate::context::{self, Schema};

/// Bring an application under GitOps management.
#[derive(Args, Debug)]
pub struct OnboardArgs {
    /// Application name; unique across the installation.
    #[arg(long)]
    pub name: String,

    /// Target cluster: a name from `argocd.clusters`, `in-cluster`, or an API server URL.
    #[arg(long)]
    pub cluster: String,

    /// Kubernetes namespace to deploy into.
    #[arg(long, default_value = OnboardRequest::DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Helm chart reference passed to the manifest generator.
    #[arg(long)]
    pub chart: String,

    /// Git repository the delivery controller tracks.
    #[arg(long)]
    pub repo: String,

    /// Path inside the repository.
    #[arg(long, default_value = OnboardRequest::DEFAULT_PATH)]
    pub path: String,

    /// Git revision to track.
    #[arg(long, default_value = OnboardRequest::DEFAULT_REVISION)]
    pub revision: String,

    /// Helm values as an inline JSON object.
    #[arg(long, value_name = "JSON", conflicts_with = "values_file")]
    pub values: Option<String>,

    /// Helm values from a YAML or JSON file.
    #[arg(long, value_name = "FILE")]
    pub values_file: Option<PathBuf>,

    /// Kubeconfig used when validating against the target cluster.
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<String>,
}

impl OnboardArgs {
    /// First write may land on a fresh database.
    const SCHEMA: Schema = Schema::Ensure;

    pub fn run(self) -> Result<()> {
        // Bad input fails before any config or network access.
        let values = self.parse_values()?;
        let config = context::load_config()?;

        let request = OnboardRequest {
            name: AppName::from(self.name),
            cluster: self.cluster,
            namespace: self.namespace,
            chart: self.chart,
            repo: self.repo,
            path: self.path,
            revision: self.revision,
            values,
            kubeconfig: self.kubeconfig,
        };

        context::block_on(async {
            let orchestrator = context::connect(&config, Self::SCHEMA).await?;
            orchestrator
                .onboard(&request)
                .await
                .with_context(|| format!("onboarding '{}' failed", request.name))
        })?;

        println!(
            "{} Onboarded '{}' to cluster '{}'",
            "✓".green().bold(),
            request.name,
            request.cluster
        );
        println!(
            "  Tracking {} @ {} ({})",
            request.repo, request.revision, request.path
        );
        Ok(())
    }

    fn parse_values(&self) -> Result<Value> {
        let values: Value = match (&self.values, &self.values_file) {
            (Some(inline), _) => {
                serde_json::from_str(inline).context("--values is not valid JSON")?
            }
            (None, Some(path)) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read values file '{}'", path.display()))?;
                serde_yaml::from_str(&contents)
                    .with_context(|| format!("values file '{}' is not valid YAML", path.display()))?
            }
            (None, None) => Value::Null,
        };
        if !matches!(values, Value::Object(_) | Value::Null) {
            bail!("Helm values must be a mapping, got: {values}");
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> OnboardArgs {
        OnboardArgs {
            name: "svc-a".to_string(),
            cluster: "prod".to_string(),
            namespace: "default".to_string(),
            chart: "charts/svc".to_string(),
            repo: "git@example.com:infra.git".to_string(),
            path: ".".to_string(),
            revision: "main".to_string(),
            values: None,
            values_file: None,
            kubeconfig: None,
        }
    }

    #[test]
    fn onboard_prepares_the_records_table() {
        assert_eq!(OnboardArgs::SCHEMA, Schema::Ensure);
    }

    #[test]
    fn no_values_is_null() {
        assert_eq!(args().parse_values().expect("values"), Value::Null);
    }

    #[test]
    fn inline_json_values() {
        let mut a = args();
        a.values = Some(r#"{"replicaCount": 3}"#.to_string());
        assert_eq!(
            a.parse_values().expect("values"),
            serde_json::json!({"replicaCount": 3})
        );
    }

    #[test]
    fn yaml_values_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "image:\n  tag: v1.2.3\nreplicaCount: 2").expect("write");
        let mut a = args();
        a.values_file = Some(file.path().to_path_buf());
        assert_eq!(
            a.parse_values().expect("values"),
            serde_json::json!({"image": {"tag": "v1.2.3"}, "replicaCount": 2})
        );
    }

    #[test]
    fn scalar_values_are_rejected() {
        let mut a = args();
        a.values = Some("42".to_string());
        assert!(a.parse_values().is_err());
    }
}
