//! Process setup shared by every subcommand: logging, config, runtime and
//! collaborator wiring.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use infrakit_core::config::{self, Config};
use infrakit_delivery::ArgoCdClient;
use infrakit_manifest::ProcessGenerator;
use infrakit_orchestrator::{Collaborators, Orchestrator, SagaSettings};
use infrakit_store::{PgRecordStore, RedisCache};

const PG_MAX_CONNECTIONS: u32 = 5;

/// Logs go to stderr so `--json` output on stdout stays parseable.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn load_config() -> Result<Config> {
    let path = config::resolve_path()?;
    config::load_at(&path).with_context(|| format!("failed to load config from {}", path.display()))
}

/// Runs `fut` to completion on a fresh multi-threaded runtime.
pub fn block_on<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(fut)
}

/// Whether [`connect`] may run DDL against the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Create the applications table if it is missing. Onboard only.
    Ensure,
    /// Use the table as found; read paths never mutate the store.
    AsIs,
}

/// Opens every backend named in `config` and assembles the orchestrator.
pub async fn connect(config: &Config, schema: Schema) -> Result<Orchestrator> {
    let settings = SagaSettings::from_config(config);
    let timeouts = settings.timeouts;

    let cache = within(
        "Redis connection",
        timeouts.cache,
        RedisCache::connect(&config.redis.url),
    )
    .await
    .context("failed to connect to Redis")?;

    let records = within(
        "PostgreSQL connection",
        timeouts.records,
        PgRecordStore::connect(&config.postgresql.url, PG_MAX_CONNECTIONS),
    )
    .await
    .context("failed to connect to PostgreSQL")?;
    if schema == Schema::Ensure {
        within("schema setup", timeouts.records, records.ensure_schema())
            .await
            .context("failed to prepare the applications table")?;
    }

    let delivery =
        ArgoCdClient::new(&config.argocd).context("failed to build the Argo CD client")?;
    let manifests = ProcessGenerator::from_config(&config.go_service);

    tracing::debug!(
        argocd = %config.argocd.api_url,
        generator = %config.go_service.path.display(),
        ?schema,
        "backends connected"
    );

    Ok(Orchestrator::new(
        Collaborators {
            cache: Arc::new(cache),
            records: Arc::new(records),
            delivery: Arc::new(delivery),
            manifests: Arc::new(manifests),
        },
        settings,
    ))
}

/// Runs a connection step under `limit`.
async fn within<T, E, F>(label: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            tracing::warn!(step = label, after_secs = limit.as_secs(), "connection timed out");
            Err(anyhow!("{label} timed out after {}s", limit.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refused() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused")
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn stalled_connection_is_cut_off() {
        let stalled = std::future::pending::<Result<(), std::io::Error>>();
        let err = within("Redis connection", Duration::from_secs(5), stalled)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Redis connection timed out after 5s");
    }

    #[tokio::test]
    async fn connection_errors_pass_through() {
        let err = within("PostgreSQL connection", Duration::from_secs(10), async {
            Err::<(), _>(refused())
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "refused");
    }
}
