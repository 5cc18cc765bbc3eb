//! The event shape yielded by the source repository's event log.
//!
//! These are exactly the fields the replication engine consumes, nothing
//! more. The log follower itself is an external collaborator (see
//! `replicator-repo-clients`); this module only defines the wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of mutation an event describes.
///
/// `Workflow` events describe effects rather than state and are always
/// skipped. `RestoreFinished` is intentionally left unhandled (see
/// DESIGN.md Open Question resolutions) and falls through to the default
/// skip branch alongside any future/unknown kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Document,
    Status,
    Acl,
    DeleteDocument,
    RestoreFinished,
    Workflow,
    /// Any event kind this engine does not recognize.
    #[serde(other)]
    Unknown,
}

/// A single item from the source repository's event log, in ascending
/// `id` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub uuid: Uuid,
    /// Document type, e.g. `core/article`.
    #[serde(rename = "type")]
    pub doc_type: String,
    pub event: EventKind,
    /// Source repository version this event refers to.
    pub version: i64,
    pub status: Option<String>,
    pub status_id: Option<i64>,
    pub updater_uri: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attached_objects: Vec<String>,
    pub delete_record_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_kind_deserializes_without_error() {
        let json = r#"{"id":1,"uuid":"11111111-1111-1111-1111-111111111111","type":"core/article","event":"some_future_kind","version":1,"status":null,"status_id":null,"updater_uri":"user://x","timestamp":"2024-01-01T00:00:00Z","attached_objects":[],"delete_record_id":null}"#;
        let ev: Event = serde_json::from_str(json).expect("should parse");
        assert_eq!(ev.event, EventKind::Unknown);
    }

    #[test]
    fn workflow_event_kind_recognized() {
        let json = r#"{"id":1,"uuid":"11111111-1111-1111-1111-111111111111","type":"core/article","event":"workflow","version":1,"status":null,"status_id":null,"updater_uri":"user://x","timestamp":"2024-01-01T00:00:00Z","attached_objects":[],"delete_record_id":null}"#;
        let ev: Event = serde_json::from_str(json).expect("should parse");
        assert_eq!(ev.event, EventKind::Workflow);
    }
}
