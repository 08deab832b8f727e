//! JSON request/response bodies exchanged with the generator.

use serde::{Deserialize, Serialize};

pub const GENERATE_COMMAND: &str = "generate-helm";
pub const VALIDATE_COMMAND: &str = "validate-k8s";

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub name: &'a str,
    pub chart: &'a str,
    pub values: &'a serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default)]
    pub manifest: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateRequest<'a> {
    pub manifest: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<&'a str>,
}

/// Older generator builds answer `success` instead of `valid`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateResponse {
    #[serde(alias = "success")]
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
