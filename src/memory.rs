//! In-memory document/graph store
//!
//! Collections map keys to JSON documents; edge collections hold
//! `collection/key` id pairs. Every stored document carries its own `_key`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::args::Direction;
use crate::order::SortOrder;
use crate::plan::{Bounds, FilterSpec};
use crate::store::{CandidateSet, EdgeDirection, Record, RecordRef, Store, StoreError};

#[derive(Debug, Clone, Default)]
struct Dataset {
    collections: HashMap<String, BTreeMap<String, Value>>,
    edges: HashMap<String, Vec<(String, String)>>,
}

impl Dataset {
    /// Records of the candidate set that pass the search filter, in key order,
    /// borrowed from the dataset.
    fn candidates<'a>(
        &'a self,
        filter: &'a FilterSpec,
    ) -> impl Iterator<Item = RecordRef<'a>> + 'a {
        let collection = self.collections.get(filter.collection);

        let keys: BTreeSet<&'a str> = match (collection, &filter.candidates) {
            (None, _) => BTreeSet::new(),
            (Some(documents), CandidateSet::All) => documents.keys().map(String::as_str).collect(),
            (Some(_), CandidateSet::Keys(keys)) => keys.iter().map(String::as_str).collect(),
            (
                Some(_),
                CandidateSet::Related {
                    from,
                    edge_collection,
                    direction,
                },
            ) => self
                .edges
                .get(edge_collection)
                .into_iter()
                .flatten()
                .filter_map(|(edge_from, edge_to)| match direction {
                    EdgeDirection::Outbound if edge_from == from => Some(edge_to),
                    EdgeDirection::Inbound if edge_to == from => Some(edge_from),
                    _ => None,
                })
                .filter_map(|id| id.split_once('/'))
                .filter(|(target, _)| *target == filter.collection)
                .map(|(_, key)| key)
                .collect(),
        };

        keys.into_iter()
            .filter_map(move |key| collection?.get_key_value(key))
            .map(|(key, document)| RecordRef::new(key, document))
            .filter(move |record| filter.admits(record))
    }
}

/// A [`Store`] over in-process data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Dataset>>,
    snapshots: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer snapshot reads to the engine.
    pub fn with_snapshots(mut self, enabled: bool) -> Self {
        self.snapshots = enabled;
        self
    }

    /// Insert or replace a document. Its `_key` is set to `key`.
    pub async fn insert(&self, collection: &str, key: &str, mut document: Value) {
        if let Value::Object(fields) = &mut document {
            fields.insert("_key".to_string(), Value::String(key.to_string()));
        }
        self.data
            .write()
            .await
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), document);
    }

    pub async fn remove(&self, collection: &str, key: &str) -> Option<Value> {
        self.data
            .write()
            .await
            .collections
            .get_mut(collection)
            .and_then(|documents| documents.remove(key))
    }

    /// Add an edge between two `collection/key` document ids.
    pub async fn link(&self, edge_collection: &str, from: &str, to: &str) {
        self.data
            .write()
            .await
            .edges
            .entry(edge_collection.to_string())
            .or_default()
            .push((from.to_string(), to.to_string()));
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_window(
        &self,
        filter: &FilterSpec,
        order: &SortOrder,
        bounds: &Bounds,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let data = self.data.read().await;
        let mut window: Vec<RecordRef<'_>> = data
            .candidates(filter)
            .filter(|record| bounds.admits(record))
            .collect();
        order.sort(&mut window);
        Ok(window
            .into_iter()
            .take(limit)
            .map(RecordRef::to_record)
            .collect())
    }

    async fn exists_beyond(
        &self,
        filter: &FilterSpec,
        order: &SortOrder,
        boundary: &Record,
        direction: Direction,
    ) -> Result<bool, StoreError> {
        let beyond = match direction {
            Direction::Forward => std::cmp::Ordering::Greater,
            Direction::Backward => std::cmp::Ordering::Less,
        };
        let data = self.data.read().await;
        let found = data
            .candidates(filter)
            .any(|record| order.compare(&record, boundary) == beyond);
        Ok(found)
    }

    async fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError> {
        let data = self.data.read().await;
        let count = data.candidates(filter).count();
        Ok(count as u64)
    }

    async fn resolve_by_key(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Record>, StoreError> {
        Ok(self
            .data
            .read()
            .await
            .collections
            .get(collection)
            .and_then(|documents| documents.get(key))
            .map(|document| Record::new(key, document.clone())))
    }

    async fn snapshot(&self) -> Result<Option<Arc<dyn Store>>, StoreError> {
        if !self.snapshots {
            return Ok(None);
        }
        let frozen = self.data.read().await.clone();
        Ok(Some(Arc::new(MemoryStore {
            data: Arc::new(RwLock::new(frozen)),
            snapshots: false,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::KeyExtractor;
    use crate::plan::SearchFilter;
    use serde_json::json;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (key, domain) in [("1", "a.gc.ca"), ("2", "b.canada.ca"), ("10", "c.gc.ca")] {
            store.insert("domains", key, json!({ "domain": domain })).await;
        }
        store.insert("organizations", "1", json!({"name": "TBS"})).await;
        store.link("claims", "organizations/1", "domains/2").await;
        store.link("claims", "organizations/1", "domains/10").await;
        store.link("claims", "organizations/2", "domains/1").await;
        store
    }

    fn filter(candidates: CandidateSet) -> FilterSpec {
        FilterSpec::new("domains", candidates)
    }

    #[test]
    fn test_insert_sets_key() {
        let store = MemoryStore::new();
        tokio_test::block_on(store.insert("domains", "5", json!({"domain": "x.ca"})));
        let record = tokio_test::block_on(store.resolve_by_key("domains", "5"))
            .unwrap()
            .unwrap();
        assert_eq!(record.get("_key"), Some(&json!("5")));
        assert_eq!(tokio_test::block_on(store.resolve_by_key("domains", "6")).unwrap(), None);
    }

    #[tokio::test]
    async fn test_candidate_sets() {
        let store = seeded().await;
        assert_eq!(store.count(&filter(CandidateSet::All)).await.unwrap(), 3);
        assert_eq!(
            store
                .count(&filter(CandidateSet::keys(["1", "10", "99"])))
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .count(&filter(CandidateSet::outbound("organizations/1", "claims")))
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .count(&FilterSpec::new(
                    "organizations",
                    CandidateSet::inbound("domains/1", "claims")
                ))
                .await
                .unwrap(),
            // organizations/2 has no document
            0
        );
    }

    #[tokio::test]
    async fn test_candidates_borrow_stored_documents() {
        let store = seeded().await;
        let data = store.data.read().await;
        let spec = filter(CandidateSet::outbound("organizations/1", "claims"));

        let found: Vec<_> = data.candidates(&spec).collect();
        let keys: Vec<_> = found.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["10", "2"]);
        assert!(std::ptr::eq(found[1].document, &data.collections["domains"]["2"]));
    }

    #[tokio::test]
    async fn test_window_sorts_bounds_and_limits() {
        let store = seeded().await;
        let order = SortOrder::by_key(KeyExtractor::Numeric);
        let mut bounds = Bounds::unbounded(order.clone());
        bounds.after = Some(Record::new("1", Value::Null));

        let window = store
            .fetch_window(&filter(CandidateSet::All), &order, &bounds, 10)
            .await
            .unwrap();
        let keys: Vec<_> = window.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2", "10"]);

        let reversed = store
            .fetch_window(&filter(CandidateSet::All), &order.reversed(), &bounds, 1)
            .await
            .unwrap();
        assert_eq!(reversed[0].key, "10");
    }

    #[tokio::test]
    async fn test_exists_beyond_and_search() {
        let store = seeded().await;
        let order = SortOrder::by_key(KeyExtractor::Numeric);
        let mut searched = filter(CandidateSet::All);
        searched.search = Some(SearchFilter::new("GC.CA", &["domain"]));

        assert_eq!(store.count(&searched).await.unwrap(), 2);
        let two = Record::new("2", Value::Null);
        assert!(store
            .exists_beyond(&searched, &order, &two, Direction::Forward)
            .await
            .unwrap());
        assert!(store
            .exists_beyond(&searched, &order, &two, Direction::Backward)
            .await
            .unwrap());
        let ten = Record::new("10", Value::Null);
        assert!(!store
            .exists_beyond(&searched, &order, &ten, Direction::Forward)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated() {
        let store = seeded().await.with_snapshots(true);
        let snapshot = store.snapshot().await.unwrap().unwrap();
        store.insert("domains", "11", json!({"domain": "d.gc.ca"})).await;

        assert_eq!(store.count(&filter(CandidateSet::All)).await.unwrap(), 4);
        assert_eq!(snapshot.count(&filter(CandidateSet::All)).await.unwrap(), 3);
        assert!(MemoryStore::new().snapshot().await.unwrap().is_none());
    }
}
