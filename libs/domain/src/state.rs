//! The four persistent entities backing replication: the checkpoint
//! state blob, the target-document index, the version-mapping row, and
//! the schema-version row the migration runner owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The checkpoint state blob, stored under the name `log_state`.
/// `position` is the largest event id whose effects are fully committed;
/// `caught_up` mirrors the follower's regime flag at the time of the last
/// commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogState {
    pub position: i64,
    pub caught_up: bool,
}

/// A target-doc record: existence implies the document exists in the
/// target; its absence means the document is new from the replicator's
/// perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDocumentRow {
    pub doc_uuid: Uuid,
    pub target_version: i64,
    pub updated_at: DateTime<Utc>,
}

/// A version-mapping row: `(doc_uuid, source_version) -> target_version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionMappingRow {
    pub doc_uuid: Uuid,
    pub source_version: i64,
    pub target_version: i64,
    pub created_at: DateTime<Utc>,
}
