//! Shapes exchanged with the target repository's `Update`/`Delete`/
//! `CreateUpload` RPCs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{Acl, Document};

/// A single status update carried on a target `Update` call. `version`
/// is always a *target* version — for a status event this comes from the
/// version map; for a catch-up snapshot it is the document's
/// freshly-assigned target version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub name: String,
    pub version: i64,
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// Preserves the document's original creation provenance across
/// replication, so a target write doesn't look authored "now" by the
/// replicator itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDirective {
    pub originally_created: DateTime<Utc>,
    pub original_creator: String,
}

/// The request body sent to the target repository's `Update` RPC.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRequest {
    pub uuid: Uuid,
    pub document: Option<Document>,
    pub acl: Option<Acl>,
    #[serde(default)]
    pub status: Vec<StatusUpdate>,
    pub import_directive: ImportDirective,
    /// Optimistic lock: omitted when the target-doc record does not yet
    /// exist, letting the write establish the document.
    pub if_match: Option<i64>,
    /// Attachment name -> upload id, populated by the attachment
    /// transfer step before the update is issued.
    #[serde(default)]
    pub attach_objects: HashMap<String, String>,
}

/// Successful result of a target `Update` call.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResult {
    pub version: i64,
}

/// Metadata carried on a target `Delete` call.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteMeta {
    pub original_delete_record: Option<i64>,
}

/// The request body sent to the target repository's `Delete` RPC.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest {
    pub uuid: Uuid,
    pub meta: DeleteMeta,
}

/// Request to create an upload ticket for an attachment transfer.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUploadRequest {
    pub name: String,
    pub content_type: String,
}

/// Result of creating an upload ticket: where to `PUT` the bytes, and the
/// id to reference once the upload completes.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUploadResult {
    pub id: String,
    pub url: String,
}
