//! Content filter: keeps documents linked into ignored sections out of
//! the target repository entirely.
//!
//! Built from `<doc_type>:<section_uuid>` configuration entries. A
//! document is rejected if its `links` block list contains a block with
//! `rel == "section"` and `uuid == section_uuid` registered for its type.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use replicator_domain::document::Document;

#[derive(Debug, Error)]
pub enum FilterConfigError {
    #[error("content filter entry missing ':' separator: {0}")]
    MissingSeparator(String),
    #[error("content filter entry has an invalid section uuid: {0}")]
    InvalidUuid(String),
}

#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    by_type: HashMap<String, Vec<Uuid>>,
}

impl ContentFilter {
    /// Parses `<doc_type>:<section_uuid>` entries, e.g. the `IGNORE_`-style
    /// comma-separated configuration values.
    pub fn parse(entries: &[String]) -> Result<Self, FilterConfigError> {
        let mut by_type: HashMap<String, Vec<Uuid>> = HashMap::new();
        for entry in entries {
            let (doc_type, section_uuid) = entry
                .split_once(':')
                .ok_or_else(|| FilterConfigError::MissingSeparator(entry.clone()))?;
            let section_uuid = Uuid::parse_str(section_uuid)
                .map_err(|_| FilterConfigError::InvalidUuid(entry.clone()))?;
            by_type.entry(doc_type.to_string()).or_default().push(section_uuid);
        }
        Ok(Self { by_type })
    }

    /// Returns true when `doc` passes every registered filter for its type
    /// (i.e. should be replicated).
    #[must_use]
    pub fn passes(&self, doc: &Document) -> bool {
        let Some(rejected_sections) = self.by_type.get(&doc.doc_type) else {
            return true;
        };

        !doc.links.iter().any(|block| {
            block.rel.as_deref() == Some("section")
                && block.uuid.is_some_and(|uuid| rejected_sections.contains(&uuid))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replicator_domain::document::Block;

    fn doc_with_links(doc_type: &str, links: Vec<Block>) -> Document {
        Document {
            uuid: Uuid::new_v4(),
            version: 1,
            doc_type: doc_type.to_string(),
            title: "t".to_string(),
            language: None,
            content: vec![],
            meta: vec![],
            links,
        }
    }

    #[test]
    fn no_registered_filter_passes() {
        let filter = ContentFilter::default();
        let doc = doc_with_links("core/article", vec![]);
        assert!(filter.passes(&doc));
    }

    #[test]
    fn matching_section_link_rejects() {
        let section = Uuid::new_v4();
        let filter = ContentFilter::parse(&[format!("core/article:{section}")]).unwrap();
        let doc = doc_with_links(
            "core/article",
            vec![Block {
                rel: Some("section".to_string()),
                uuid: Some(section),
                ..Default::default()
            }],
        );
        assert!(!filter.passes(&doc));
    }

    #[test]
    fn non_section_rel_does_not_reject() {
        let section = Uuid::new_v4();
        let filter = ContentFilter::parse(&[format!("core/article:{section}")]).unwrap();
        let doc = doc_with_links(
            "core/article",
            vec![Block {
                rel: Some("author".to_string()),
                uuid: Some(section),
                ..Default::default()
            }],
        );
        assert!(filter.passes(&doc));
    }

    #[test]
    fn different_doc_type_is_unaffected() {
        let section = Uuid::new_v4();
        let filter = ContentFilter::parse(&[format!("core/article:{section}")]).unwrap();
        let doc = doc_with_links(
            "core/gallery",
            vec![Block {
                rel: Some("section".to_string()),
                uuid: Some(section),
                ..Default::default()
            }],
        );
        assert!(filter.passes(&doc));
    }

    #[test]
    fn malformed_entry_is_rejected_at_parse_time() {
        assert!(ContentFilter::parse(&["no-colon-here".to_string()]).is_err());
        assert!(ContentFilter::parse(&["core/article:not-a-uuid".to_string()]).is_err());
    }
}
