//! The backing-store boundary
//!
//! The engine only needs four primitive reads from a document store. Every
//! argument reaching a [`Store`] has already been validated, and caller text
//! only arrives inside typed values (keys, search terms), never as query text.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::args::Direction;
use crate::order::SortOrder;
use crate::plan::{Bounds, FilterSpec};

/// A stored document and its key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub document: Value,
}

impl Record {
    pub fn new(key: impl Into<String>, document: Value) -> Self {
        Self {
            key: key.into(),
            document,
        }
    }

    /// Look up a dot-separated path in the document.
    pub fn get(&self, path: &str) -> Option<&Value> {
        RecordView::get(self, path)
    }
}

/// Read access to a keyed document, owned or borrowed.
///
/// Ordering and filtering work against this so a store can rank its own
/// documents without cloning them first.
pub trait RecordView {
    fn key(&self) -> &str;

    fn document(&self) -> &Value;

    fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(self.document(), |value, segment| value.get(segment))
    }
}

impl RecordView for Record {
    fn key(&self) -> &str {
        &self.key
    }

    fn document(&self) -> &Value {
        &self.document
    }
}

/// A record borrowed from a store's own storage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordRef<'a> {
    pub key: &'a str,
    pub document: &'a Value,
}

impl<'a> RecordRef<'a> {
    pub fn new(key: &'a str, document: &'a Value) -> Self {
        Self { key, document }
    }

    pub fn to_record(self) -> Record {
        Record::new(self.key, self.document.clone())
    }
}

impl RecordView for RecordRef<'_> {
    fn key(&self) -> &str {
        self.key
    }

    fn document(&self) -> &Value {
        self.document
    }
}

/// Direction of a graph hop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Outbound,
    Inbound,
}

/// The universe of records a connection paginates over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSet {
    /// Every record in the collection
    All,
    /// Records whose key is in the list
    Keys(Vec<String>),
    /// Records one edge away from `from` (a `collection/key` document id)
    Related {
        from: String,
        edge_collection: String,
        direction: EdgeDirection,
    },
}

impl CandidateSet {
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        CandidateSet::Keys(keys.into_iter().map(Into::into).collect())
    }

    pub fn outbound(from: impl Into<String>, edge_collection: impl Into<String>) -> Self {
        CandidateSet::Related {
            from: from.into(),
            edge_collection: edge_collection.into(),
            direction: EdgeDirection::Outbound,
        }
    }

    pub fn inbound(from: impl Into<String>, edge_collection: impl Into<String>) -> Self {
        CandidateSet::Related {
            from: from.into(),
            edge_collection: edge_collection.into(),
            direction: EdgeDirection::Inbound,
        }
    }
}

/// Failures raised by a store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("record `{key}` is malformed: {reason}")]
    Malformed { key: String, reason: String },
}

/// Primitive reads the pagination engine runs against.
#[async_trait]
pub trait Store: Send + Sync {
    /// Records of `filter` admitted by `bounds`, sorted by `order`, at most `limit`.
    async fn fetch_window(
        &self,
        filter: &FilterSpec,
        order: &SortOrder,
        bounds: &Bounds,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError>;

    /// Whether any record of `filter` lies strictly beyond `boundary` in
    /// `order`: after it for `Forward`, before it for `Backward`.
    ///
    /// Implementations must not materialize more than one record.
    async fn exists_beyond(
        &self,
        filter: &FilterSpec,
        order: &SortOrder,
        boundary: &Record,
        direction: Direction,
    ) -> Result<bool, StoreError>;

    async fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError>;

    async fn resolve_by_key(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Record>, StoreError>;

    /// Pin a consistent read view.
    ///
    /// Stores without snapshot reads return `None` and are read live.
    async fn snapshot(&self) -> Result<Option<Arc<dyn Store>>, StoreError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_path_lookup() {
        let record = Record::new(
            "summary1",
            json!({"domain": "a.gc.ca", "categoryTotals": {"fail": 3}}),
        );
        assert_eq!(record.get("domain"), Some(&json!("a.gc.ca")));
        assert_eq!(record.get("categoryTotals.fail"), Some(&json!(3)));
        assert_eq!(record.get("categoryTotals.pass"), None);
        assert_eq!(record.get("domain.inner"), None);
    }

    #[test]
    fn test_borrowed_record_reads_like_owned() {
        let document = json!({"status": {"dkim": "pass"}});
        let borrowed = RecordRef::new("12", &document);
        assert_eq!(borrowed.get("status.dkim"), Some(&json!("pass")));
        assert_eq!(borrowed.key(), "12");
        assert_eq!(borrowed.to_record(), Record::new("12", document.clone()));
    }

    #[test]
    fn test_candidate_set_constructors() {
        assert_eq!(
            CandidateSet::keys(["a1", "a2"]),
            CandidateSet::Keys(vec!["a1".to_string(), "a2".to_string()])
        );
        assert_eq!(
            CandidateSet::outbound("users/1", "affiliations"),
            CandidateSet::Related {
                from: "users/1".to_string(),
                edge_collection: "affiliations".to_string(),
                direction: EdgeDirection::Outbound,
            }
        );
    }
}
