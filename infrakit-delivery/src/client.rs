//! HTTP plumbing for the Argo CD API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use infrakit_core::config::ArgoCdConfig;
use infrakit_core::error::DeliveryError;
use infrakit_core::ports::DeliveryController;
use infrakit_core::types::{AppName, ApplicationRecord, ControllerStatus};

use crate::application::{Application, ApplicationStatusResponse};

/// API server of the cluster Argo CD itself runs in.
pub const IN_CLUSTER_SERVER: &str = "https://kubernetes.default.svc";

#[derive(Debug, Clone)]
pub struct ArgoCdClient {
    base_url: String,
    username: String,
    password: String,
    namespace: String,
    project: String,
    clusters: BTreeMap<String, String>,
    http: reqwest::Client,
}

impl ArgoCdClient {
    pub fn new(config: &ArgoCdConfig) -> Result<Self, DeliveryError> {
        let base_url = normalize_base_url(&config.api_url)?;
        Ok(Self {
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            namespace: config.namespace.clone(),
            project: config.project.clone(),
            clusters: config.clusters.clone(),
            http: reqwest::Client::new(),
        })
    }

    pub fn applications_path() -> &'static str {
        "/api/v1/applications"
    }

    pub fn application_path(name: &AppName) -> String {
        format!("/api/v1/applications/{name}")
    }

    pub fn sync_path(name: &AppName) -> String {
        format!("/api/v1/applications/{name}/sync")
    }

    /// `spec.destination.server` for a cluster name or URL.
    ///
    /// With no `clusters` map configured every name deploys in-cluster.
    pub fn destination_server(&self, cluster: &str) -> Result<String, DeliveryError> {
        if cluster.starts_with("https://") || cluster.starts_with("http://") {
            return Ok(cluster.to_string());
        }
        if let Some(server) = self.clusters.get(cluster) {
            return Ok(server.clone());
        }
        if cluster == "in-cluster" || self.clusters.is_empty() {
            return Ok(IN_CLUSTER_SERVER.to_string());
        }
        Err(DeliveryError::UnknownCluster(cluster.to_string()))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<Req>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        payload: &Req,
    ) -> Result<reqwest::Response, DeliveryError>
    where
        Req: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(self.endpoint(path))
            .query(query)
            .basic_auth(&self.username, Some(&self.password))
            .json(payload)
            .send()
            .await
            .map_err(request_err)?;
        ensure_success(response).await
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, DeliveryError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(request_err)?;
        ensure_success(response).await
    }
}

#[async_trait]
impl DeliveryController for ArgoCdClient {
    async fn resolve_destination(&self, cluster: &str) -> Result<String, DeliveryError> {
        self.destination_server(cluster)
    }

    async fn create_or_update_application(
        &self,
        record: &ApplicationRecord,
    ) -> Result<(), DeliveryError> {
        let server = self.destination_server(&record.cluster)?;
        let app = Application::for_record(record, &self.namespace, &self.project, server);
        self.post_json(Self::applications_path(), &[("upsert", "true")], &app)
            .await?;
        tracing::debug!(app = %record.name, "argocd application registered");
        Ok(())
    }

    async fn sync_application(&self, name: &AppName) -> Result<(), DeliveryError> {
        self.post_json(&Self::sync_path(name), &[], &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn get_application_status(
        &self,
        name: &AppName,
    ) -> Result<ControllerStatus, DeliveryError> {
        let response = self.get(&Self::application_path(name)).await?;
        let bytes = response.bytes().await.map_err(request_err)?;
        let decoded: ApplicationStatusResponse =
            serde_json::from_slice(&bytes).map_err(|e| DeliveryError::Decode {
                message: e.to_string(),
            })?;
        Ok(decoded.into())
    }
}

/// Pass 2xx responses through; turn anything else into `Http` with the body.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = match body.trim() {
        "" => "<empty>".to_string(),
        trimmed => trimmed.to_string(),
    };
    Err(DeliveryError::Http {
        status: status.as_u16(),
        body,
    })
}

fn request_err(err: reqwest::Error) -> DeliveryError {
    DeliveryError::Request {
        message: err.to_string(),
    }
}

fn normalize_base_url(base_url: &str) -> Result<String, DeliveryError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(DeliveryError::BaseUrlMissing);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
