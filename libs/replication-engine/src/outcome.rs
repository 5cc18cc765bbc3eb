//! Result of applying a single event.

use thiserror::Error;

use replicator_db::DbError;
use replicator_repo_clients::RepositoryError;

/// What happened to one event. Conflict is tracked separately from
/// Skipped in the type even though the replication loop treats them
/// identically for checkpointing purposes — the distinction only matters
/// for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Skipped { reason: String },
    Conflict { reason: String },
}

impl ApplyOutcome {
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// True for both `Skipped` and `Conflict` — the two outcomes the
    /// replication loop checkpoints past without advancing `last_saved`
    /// inside the applier's own transaction.
    #[must_use]
    pub fn advances_position_only(&self) -> bool {
        !matches!(self, Self::Applied)
    }
}

/// Anything that should terminate the replication loop rather than be
/// logged and skipped.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("database error")]
    Database(#[from] DbError),
    #[error("repository error")]
    Repository(#[from] RepositoryError),
    #[error("sqlx error")]
    Sqlx(#[from] sqlx::Error),
    #[error("{0}")]
    Other(String),
}
