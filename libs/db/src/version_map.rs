//! Version-mapping table backing `version_mappings`.
//!
//! Every create/update the applier performs against the target repository
//! records a `(doc_uuid, source_version) -> target_version` row so that a
//! later status event referencing an older source version can be rewritten
//! to the version the target repository actually holds.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::errors::DbError;
use replicator_domain::state::VersionMappingRow;

pub struct VersionMap;

impl VersionMap {
    pub async fn insert<'e, E>(
        executor: E,
        doc_uuid: Uuid,
        source_version: i64,
        target_version: i64,
    ) -> Result<(), DbError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO version_mappings (doc_uuid, source_version, target_version, created_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (doc_uuid, source_version) DO UPDATE \
             SET target_version = EXCLUDED.target_version",
        )
        .bind(doc_uuid)
        .bind(source_version)
        .bind(target_version)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Looks up the target version a source version was mapped to. A miss
    /// means this source version was never replicated as a content event —
    /// the caller (a status event handler) must skip rather than guess at a
    /// target version.
    pub async fn lookup<'e, E>(
        executor: E,
        doc_uuid: Uuid,
        source_version: i64,
    ) -> Result<Option<i64>, DbError>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT target_version FROM version_mappings \
             WHERE doc_uuid = $1 AND source_version = $2",
        )
        .bind(doc_uuid)
        .bind(source_version)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(|(v,)| v))
    }

    pub async fn delete_for_doc<'e, E>(executor: E, doc_uuid: Uuid) -> Result<(), DbError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM version_mappings WHERE doc_uuid = $1")
            .bind(doc_uuid)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Prunes mappings older than `cutoff` (the cleanup worker's six-month
    /// default retention). Returns the number of rows removed.
    pub async fn prune_older_than<'e, E>(
        executor: E,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DbError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM version_mappings WHERE created_at < $1")
            .bind(cutoff)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn all_for_doc<'e, E>(
        executor: E,
        doc_uuid: Uuid,
    ) -> Result<Vec<VersionMappingRow>, DbError>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<VersionMappingRowSql> = sqlx::query_as(
            "SELECT doc_uuid, source_version, target_version, created_at \
             FROM version_mappings WHERE doc_uuid = $1 ORDER BY source_version",
        )
        .bind(doc_uuid)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct VersionMappingRowSql {
    doc_uuid: Uuid,
    source_version: i64,
    target_version: i64,
    created_at: DateTime<Utc>,
}

impl From<VersionMappingRowSql> for VersionMappingRow {
    fn from(row: VersionMappingRowSql) -> Self {
        Self {
            doc_uuid: row.doc_uuid,
            source_version: row.source_version,
            target_version: row.target_version,
            created_at: row.created_at,
        }
    }
}
