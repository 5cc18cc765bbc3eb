//! Durable checkpoint storage backing `replicator_state`.
//!
//! Checkpoints are stored as an opaque JSON blob under a caller-chosen
//! `name`, keyed the same way the workflow cursor table in this stack
//! stores its state. Generic over `sqlx::PgExecutor` so the event applier
//! can write a checkpoint inside the same transaction as its other writes.

use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgExecutor;

use crate::errors::DbError;

pub struct StateStore;

impl StateStore {
    /// Loads the value stored under `name`, if any.
    pub async fn load<'e, E, T>(executor: E, name: &str) -> Result<Option<T>, DbError>
    where
        E: PgExecutor<'e>,
        T: DeserializeOwned,
    {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT value FROM replicator_state WHERE name = $1")
                .bind(name)
                .fetch_optional(executor)
                .await?;

        match row {
            Some((value,)) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Upserts the value stored under `name`.
    pub async fn store<'e, E, T>(executor: E, name: &str, value: &T) -> Result<(), DbError>
    where
        E: PgExecutor<'e>,
        T: Serialize + Sync,
    {
        let encoded = serde_json::to_value(value)?;
        sqlx::query(
            "INSERT INTO replicator_state (name, value, updated_at) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(name)
        .bind(encoded)
        .execute(executor)
        .await?;
        Ok(())
    }
}
