//! Engine and per-domain configuration

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::order::{KeyExtractor, OrderFieldDef, ValueKind};

/// Largest `first`/`last` a caller may request by default.
pub const DEFAULT_MAX_LIMIT: i64 = 100;

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub max_limit: i64,
    /// Route all reads of a call through a store snapshot when one is offered
    pub snapshot_reads: bool,
    /// Deadline applied to each store operation
    pub store_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_limit: DEFAULT_MAX_LIMIT,
            snapshot_reads: true,
            store_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }
}

/// Everything that distinguishes one paginated entity type from another.
///
/// # Example
///
/// ```rust
/// use tracker_connections::config::DomainConfig;
/// use tracker_connections::order::ValueKind;
///
/// let config = DomainConfig::new("guidanceTags", "guidanceTags")
///     .connection_name("GuidanceTag")
///     .loader_name("loadGuidanceTagConnectionsByTagId")
///     .order_field("tag-name", "tagName", ValueKind::Text);
///
/// assert!(config.order_field_def("tag-name").is_some());
/// assert!(config.order_field_def("tagName").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct DomainConfig {
    tag: &'static str,
    collection: &'static str,
    connection_name: &'static str,
    loader_name: &'static str,
    order_fields: BTreeMap<&'static str, OrderFieldDef>,
    search_fields: Vec<&'static str>,
    key_extractor: KeyExtractor,
}

impl DomainConfig {
    /// `tag` is written into cursors; `collection` is what the store reads.
    pub fn new(tag: &'static str, collection: &'static str) -> Self {
        Self {
            tag,
            collection,
            connection_name: tag,
            loader_name: tag,
            order_fields: BTreeMap::new(),
            search_fields: Vec::new(),
            key_extractor: KeyExtractor::default(),
        }
    }

    /// Name used in user-facing messages
    pub fn connection_name(mut self, name: &'static str) -> Self {
        self.connection_name = name;
        self
    }

    /// Name used in diagnostics
    pub fn loader_name(mut self, name: &'static str) -> Self {
        self.loader_name = name;
        self
    }

    pub fn order_field(mut self, name: &'static str, path: &'static str, kind: ValueKind) -> Self {
        self.order_fields
            .insert(name, OrderFieldDef { name, path, kind });
        self
    }

    pub fn search_field(mut self, path: &'static str) -> Self {
        self.search_fields.push(path);
        self
    }

    pub fn key_extractor(mut self, extractor: KeyExtractor) -> Self {
        self.key_extractor = extractor;
        self
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn name(&self) -> &'static str {
        self.connection_name
    }

    pub fn loader(&self) -> &'static str {
        self.loader_name
    }

    pub fn order_field_def(&self, name: &str) -> Option<&OrderFieldDef> {
        self.order_fields.get(name)
    }

    pub fn order_field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order_fields.keys().copied()
    }

    pub fn search_fields(&self) -> &[&'static str] {
        &self.search_fields
    }

    pub fn extractor(&self) -> KeyExtractor {
        self.key_extractor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_limit, 100);
        assert!(config.snapshot_reads);
        assert_eq!(config.store_timeout(), None);
    }

    #[test]
    fn test_engine_config_overrides() {
        let raw = r#"{"maxLimit": 50, "snapshotReads": false, "storeTimeoutMs": 250}"#;
        let config = EngineConfig::from_json(raw).unwrap();
        assert_eq!(config.max_limit, 50);
        assert!(!config.snapshot_reads);
        assert_eq!(config.store_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_domain_config_lookup_table() {
        let config = DomainConfig::new("dmarcSummaries", "dmarcSummaries")
            .order_field("fail-count", "categoryTotals.fail", ValueKind::Number)
            .order_field("domain", "domain", ValueKind::Text)
            .search_field("domain");

        assert_eq!(config.name(), "dmarcSummaries");
        assert_eq!(
            config.order_field_def("fail-count").map(|f| f.path),
            Some("categoryTotals.fail")
        );
        assert_eq!(
            config.order_field_names().collect::<Vec<_>>(),
            vec!["domain", "fail-count"]
        );
        assert_eq!(config.search_fields(), &["domain"]);
        assert_eq!(config.extractor(), KeyExtractor::TrailingDigits);
    }
}
