//! Filtering and attachment-scope configuration consumed by the applier.
//! Loading these from environment variables is `apps/replicator`'s job;
//! this module only owns the parsed shape and the predicates built from
//! it.

use std::collections::HashSet;

/// Event types and updater identities the applier drops unconditionally
/// before any regime dispatch.
#[derive(Debug, Clone, Default)]
pub struct IgnoreConfig {
    pub ignore_types: HashSet<String>,
    pub ignore_subs: HashSet<String>,
}

impl IgnoreConfig {
    #[must_use]
    pub fn new(ignore_types: Vec<String>, ignore_subs: Vec<String>) -> Self {
        Self {
            ignore_types: ignore_types.into_iter().collect(),
            ignore_subs: ignore_subs.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn ignores_type(&self, doc_type: &str) -> bool {
        self.ignore_types.contains(doc_type)
    }

    #[must_use]
    pub fn ignores_updater(&self, updater_uri: &str) -> bool {
        self.ignore_subs.contains(updater_uri)
    }
}

/// Which attachments the attachment-transfer step is allowed to copy.
#[derive(Debug, Clone, Default)]
pub struct AttachmentScopeConfig {
    pub all_attachments: bool,
    /// `(attachment_name, doc_type)` pairs explicitly allowed.
    pub include: HashSet<(String, String)>,
}

impl AttachmentScopeConfig {
    #[must_use]
    pub fn new(all_attachments: bool, include: Vec<(String, String)>) -> Self {
        Self {
            all_attachments,
            include: include.into_iter().collect(),
        }
    }

    /// Parses `name.doc_type` entries, as found in the `INCLUDE_ATTACHMENTS`
    /// environment variable, split at the first dot.
    #[must_use]
    pub fn parse_include_entries(entries: &[String]) -> Vec<(String, String)> {
        entries
            .iter()
            .filter_map(|entry| entry.split_once('.'))
            .map(|(name, doc_type)| (name.to_string(), doc_type.to_string()))
            .collect()
    }

    #[must_use]
    pub fn in_scope(&self, name: &str, doc_type: &str) -> bool {
        self.all_attachments
            || self
                .include
                .contains(&(name.to_string(), doc_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_config_matches_exact_entries() {
        let cfg = IgnoreConfig::new(
            vec!["core/internal".to_string()],
            vec!["user://bot".to_string()],
        );
        assert!(cfg.ignores_type("core/internal"));
        assert!(!cfg.ignores_type("core/article"));
        assert!(cfg.ignores_updater("user://bot"));
    }

    #[test]
    fn attachment_scope_all_attachments_overrides_allowlist() {
        let cfg = AttachmentScopeConfig::new(true, vec![]);
        assert!(cfg.in_scope("anything", "core/article"));
    }

    #[test]
    fn attachment_scope_allowlist_requires_exact_pair() {
        let cfg = AttachmentScopeConfig::new(
            false,
            vec![("image".to_string(), "core/image".to_string())],
        );
        assert!(cfg.in_scope("image", "core/image"));
        assert!(!cfg.in_scope("image", "core/gallery"));
        assert!(!cfg.in_scope("thumb", "core/image"));
    }

    #[test]
    fn parse_include_entries_splits_at_first_dot() {
        let parsed =
            AttachmentScopeConfig::parse_include_entries(&["image.core/image".to_string()]);
        assert_eq!(parsed, vec![("image".to_string(), "core/image".to_string())]);
    }
}
