//! Error types for infrakit-core and the collaborator ports.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed source error carried by backend failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that can arise while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// A required top-level section is absent.
    #[error("missing required config section '{0}'")]
    MissingSection(&'static str),

    /// A section is present but carries an unusable value.
    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    /// `dirs::home_dir()` returned `None` and `$INFRAKIT_CONFIG` is unset.
    #[error("cannot determine home directory; set $HOME or $INFRAKIT_CONFIG")]
    HomeNotFound,
}

/// Failures of the lock & state cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[source] BoxError),

    /// A cached snapshot exists but does not decode.
    #[error("cached state for '{name}' is not valid JSON: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the durable record store.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("record store error: {0}")]
    Backend(#[source] BoxError),
}

/// Failures talking to the delivery controller.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery controller api url is missing")]
    BaseUrlMissing,

    #[error("delivery controller request failed: {message}")]
    Request { message: String },

    /// Any non-success response; `body` is the controller's response text.
    #[error("delivery controller returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("delivery controller response did not decode: {message}")]
    Decode { message: String },

    #[error("no destination server configured for cluster '{0}'")]
    UnknownCluster(String),
}

/// Failures of the external manifest generator process.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to launch manifest generator {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest generator I/O failed during '{command}': {source}")]
    Io {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest generator '{command}' exited with {code}: {stderr}")]
    Exit {
        command: &'static str,
        code: String,
        stderr: String,
    },

    #[error("manifest generator '{command}' returned malformed output: {source}")]
    Malformed {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest generator '{command}' response is missing '{field}'")]
    Incomplete {
        command: &'static str,
        field: &'static str,
    },

    /// The generator ran fine but refused the chart/values combination.
    #[error("chart could not be rendered: {0}")]
    Rejected(String),
}

impl ManifestError {
    /// True when the generator judged the input invalid, as opposed to the
    /// tool or its environment being broken.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ManifestError::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_section_names_the_section() {
        let msg = ConfigError::MissingSection("argocd").to_string();
        assert_eq!(msg, "missing required config section 'argocd'");
    }

    #[test]
    fn http_error_carries_body() {
        let err = DeliveryError::Http {
            status: 403,
            body: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn only_rejected_counts_as_rejection() {
        assert!(ManifestError::Rejected("bad chart".into()).is_rejection());
        let exit = ManifestError::Exit {
            command: "generate-helm",
            code: "1".into(),
            stderr: String::new(),
        };
        assert!(!exit.is_rejection());
    }
}
