//! Document content, blocks, and current-state metadata.
//!
//! `Block` models the nested structure a document's `content`/`meta`/
//! `links` sections are built from — the content filter only ever
//! inspects the `links` block list, but all three sections share the
//! same shape in the source repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single content/meta/links block. Intentionally permissive: unknown
/// fields land in `data` rather than causing a deserialization failure,
/// since this engine only ever reads `rel` and `uuid` off of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub uuid: Option<Uuid>,
    pub uri: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub rel: Option<String>,
    #[serde(default)]
    pub data: HashMap<String, String>,
    #[serde(default)]
    pub content: Vec<Block>,
    #[serde(default)]
    pub links: Vec<Block>,
}

/// A fetched document body at a specific version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub uuid: Uuid,
    pub version: i64,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub title: String,
    pub language: Option<String>,
    #[serde(default)]
    pub content: Vec<Block>,
    #[serde(default)]
    pub meta: Vec<Block>,
    #[serde(default)]
    pub links: Vec<Block>,
}

/// Opaque ACL blob, copied verbatim between source and target.
///
/// The shape of an ACL entry is owned by the repository API, not by this
/// engine — it only ever reads `meta.acl` and forwards it unmodified.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Acl(pub serde_json::Value);

/// The version (and raw status metadata) a named status currently points
/// at, as reported by the source repository's meta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHead {
    pub version: i64,
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// A single attachment as listed in a document's current meta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentInfo {
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Current-state metadata for a document, as returned by `GetMeta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub acl: Acl,
    pub created: DateTime<Utc>,
    pub creator_uri: String,
    pub current_version: i64,
    pub heads: HashMap<String, StatusHead>,
    #[serde(default)]
    pub attachments: Vec<AttachmentInfo>,
}

/// A fetched status document, as returned by `GetStatus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDocument {
    pub meta: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_missing_optional_fields_defaults_cleanly() {
        let json = r#"{"type":"core/text"}"#;
        let block: Block = serde_json::from_str(json).expect("should parse");
        assert_eq!(block.kind, "core/text");
        assert!(block.rel.is_none());
        assert!(block.links.is_empty());
    }

    #[test]
    fn nested_links_are_preserved() {
        let json = r#"{"type":"core/article","links":[{"type":"core/section","rel":"section","uuid":"11111111-1111-1111-1111-111111111111"}]}"#;
        let block: Block = serde_json::from_str(json).expect("should parse");
        assert_eq!(block.links.len(), 1);
        assert_eq!(block.links[0].rel.as_deref(), Some("section"));
    }
}
