use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use infrakit_core::config::GoServiceConfig;
use infrakit_core::error::ManifestError;
use infrakit_core::ports::ManifestGenerator;
use infrakit_core::types::{AppName, RenderedManifest, ValidationOutcome};

use crate::protocol::{
    GenerateRequest, GenerateResponse, ValidateRequest, ValidateResponse, GENERATE_COMMAND,
    VALIDATE_COMMAND,
};

/// Runs the generator executable once per request.
///
/// The child is killed if the calling future is dropped, so an enclosing
/// timeout does not leave stray processes behind.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl ProcessGenerator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_args(program: impl Into<PathBuf>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            leading_args,
        }
    }

    pub fn from_config(config: &GoServiceConfig) -> Self {
        Self::with_args(config.path.clone(), config.args.clone())
    }

    async fn call<Req, Res>(&self, command: &'static str, request: &Req) -> Result<Res, ManifestError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request).map_err(|e| ManifestError::Io {
            command,
            source: std::io::Error::other(e),
        })?;

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ManifestError::Spawn {
                path: self.program.clone(),
                source,
            })?;

        // Feed stdin while stdout and stderr drain, so a child that writes
        // before reading cannot fill a pipe and stall.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&payload).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        // A child that exits without draining stdin is judged by its exit
        // status below, not by the broken pipe.
        match fed {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
            Err(source) => return Err(ManifestError::Io { command, source }),
        }
        let output = output.map_err(|source| ManifestError::Io { command, source })?;

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(command, %code, "manifest generator exited unsuccessfully");
            return Err(ManifestError::Exit {
                command,
                code,
                stderr,
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|source| ManifestError::Malformed { command, source })
    }
}

#[async_trait]
impl ManifestGenerator for ProcessGenerator {
    async fn generate(
        &self,
        name: &AppName,
        chart: &str,
        values: &serde_json::Value,
    ) -> Result<RenderedManifest, ManifestError> {
        let request = GenerateRequest {
            name: name.as_str(),
            chart,
            values,
        };
        let response: GenerateResponse = self.call(GENERATE_COMMAND, &request).await?;
        if !response.success {
            return Err(ManifestError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "generator reported failure without detail".to_string()),
            ));
        }
        let manifest = response.manifest.ok_or(ManifestError::Incomplete {
            command: GENERATE_COMMAND,
            field: "manifest",
        })?;
        Ok(RenderedManifest { manifest })
    }

    async fn validate(
        &self,
        manifest: &RenderedManifest,
        kubeconfig: Option<&str>,
    ) -> Result<ValidationOutcome, ManifestError> {
        let request = ValidateRequest {
            manifest: &manifest.manifest,
            kubeconfig,
        };
        let response: ValidateResponse = self.call(VALIDATE_COMMAND, &request).await?;
        if response.valid {
            if let Some(message) = &response.message {
                tracing::debug!(%message, "manifest accepted by validator");
            }
        }
        Ok(ValidationOutcome {
            valid: response.valid,
            error: response.error,
        })
    }
}
