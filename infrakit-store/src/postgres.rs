//! PostgreSQL-backed application record store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};

use infrakit_core::error::RecordStoreError;
use infrakit_core::ports::RecordStore;
use infrakit_core::types::{AppName, ApplicationRecord};

/// `applications` table DDL (embedded, idempotent).
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// One statement, so concurrent writers race inside PostgreSQL's conflict
/// handling rather than between a read and a write.
const UPSERT_SQL: &str = "\
INSERT INTO applications (name, cluster, namespace, helm_chart, git_repo, git_revision, git_path, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
ON CONFLICT (name) DO UPDATE
SET cluster = EXCLUDED.cluster,
    namespace = EXCLUDED.namespace,
    helm_chart = EXCLUDED.helm_chart,
    git_repo = EXCLUDED.git_repo,
    git_revision = EXCLUDED.git_revision,
    git_path = EXCLUDED.git_path,
    updated_at = NOW()";

const SELECT_SQL: &str = "\
SELECT name, cluster, namespace, helm_chart, git_repo, git_revision, git_path, updated_at
FROM applications
WHERE name = $1";

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Connect from a `postgres://` URL.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RecordStoreError> {
        let opts = PgConnectOptions::from_str(url).map_err(backend)?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await
            .map_err(backend)?;
        tracing::debug!("connected to postgresql");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `applications` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RecordStoreError> {
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn upsert_application(
        &self,
        record: &ApplicationRecord,
    ) -> Result<(), RecordStoreError> {
        sqlx::query(UPSERT_SQL)
            .bind(record.name.as_str())
            .bind(&record.cluster)
            .bind(&record.namespace)
            .bind(&record.helm_chart)
            .bind(&record.git_repo)
            .bind(&record.git_revision)
            .bind(&record.git_path)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_application(
        &self,
        name: &AppName,
    ) -> Result<Option<ApplicationRecord>, RecordStoreError> {
        let row = sqlx::query(SELECT_SQL)
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(|row| -> Result<ApplicationRecord, sqlx::Error> {
            Ok(ApplicationRecord {
                name: AppName::from(row.try_get::<String, _>("name")?),
                cluster: row.try_get("cluster")?,
                namespace: row.try_get("namespace")?,
                helm_chart: row.try_get("helm_chart")?,
                git_repo: row.try_get("git_repo")?,
                git_revision: row.try_get("git_revision")?,
                git_path: row.try_get("git_path")?,
                updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            })
        })
        .transpose()
        .map_err(backend)
    }
}

fn backend(err: sqlx::Error) -> RecordStoreError {
    RecordStoreError::Backend(Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_a_single_idempotent_statement() {
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS applications"));
        assert!(!SCHEMA_SQL.trim_end().contains(';'));
    }

    #[test]
    fn upsert_conflicts_on_name_and_bumps_updated_at() {
        assert!(UPSERT_SQL.contains("ON CONFLICT (name) DO UPDATE"));
        let update_clause = UPSERT_SQL
            .split("DO UPDATE")
            .nth(1)
            .expect("update clause");
        for column in [
            "cluster",
            "namespace",
            "helm_chart",
            "git_repo",
            "git_revision",
            "git_path",
        ] {
            assert!(
                update_clause.contains(&format!("{column} = EXCLUDED.{column}")),
                "{column} must be overwritten on conflict"
            );
        }
        assert!(update_clause.contains("updated_at = NOW()"));
    }
}
