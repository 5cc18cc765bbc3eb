//! Target-document index backing `target_documents`.
//!
//! Tracks the last version the replicator wrote for each document in the
//! target repository, so the applier can decide create-vs-update and can
//! reject writes that would regress a version.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::errors::DbError;
use replicator_domain::state::TargetDocumentRow;

pub struct TargetIndex;

impl TargetIndex {
    pub async fn get<'e, E>(
        executor: E,
        doc_uuid: Uuid,
    ) -> Result<Option<TargetDocumentRow>, DbError>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<TargetDocumentRowSql> = sqlx::query_as(
            "SELECT doc_uuid, target_version, updated_at \
             FROM target_documents WHERE doc_uuid = $1",
        )
        .bind(doc_uuid)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn upsert<'e, E>(
        executor: E,
        doc_uuid: Uuid,
        target_version: i64,
    ) -> Result<(), DbError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO target_documents (doc_uuid, target_version, updated_at) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (doc_uuid) DO UPDATE \
             SET target_version = EXCLUDED.target_version, updated_at = now()",
        )
        .bind(doc_uuid)
        .bind(target_version)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(executor: E, doc_uuid: Uuid) -> Result<(), DbError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM target_documents WHERE doc_uuid = $1")
            .bind(doc_uuid)
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TargetDocumentRowSql {
    doc_uuid: Uuid,
    target_version: i64,
    updated_at: DateTime<Utc>,
}

impl From<TargetDocumentRowSql> for TargetDocumentRow {
    fn from(row: TargetDocumentRowSql) -> Self {
        Self {
            doc_uuid: row.doc_uuid,
            target_version: row.target_version,
            updated_at: row.updated_at,
        }
    }
}
