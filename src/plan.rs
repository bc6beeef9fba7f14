//! Query plans
//!
//! A [`QueryPlan`] fixes everything a page needs before any window is read:
//! the filtered candidate set, the effective sort order, the boundary
//! records decoded from `after`/`before`, and the window direction and size.
//! Ordering and boundaries come from the same [`SortOrder`], so a boundary
//! predicate is "strictly after/before the reference record" in exactly the
//! order the page is sorted by.

use std::cmp::Ordering;

use serde_json::Value;

use crate::args::{Argument, Direction, PageRequest};
use crate::config::DomainConfig;
use crate::cursor::CursorError;
use crate::order::SortOrder;
use crate::store::{CandidateSet, Record, RecordView, Store};
use crate::ConnectionError;

/// Case-insensitive substring match over a fixed set of document paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    /// Lowercased search term
    pub term: String,
    pub fields: Vec<&'static str>,
}

impl SearchFilter {
    pub fn new(term: &str, fields: &[&'static str]) -> Self {
        Self {
            term: term.to_lowercase(),
            fields: fields.to_vec(),
        }
    }

    pub fn matches<R: RecordView>(&self, record: &R) -> bool {
        self.fields.iter().any(|path| match record.get(path) {
            Some(Value::String(s)) => s.to_lowercase().contains(&self.term),
            Some(Value::Number(n)) => n.to_string().contains(&self.term),
            _ => false,
        })
    }
}

/// Which records take part in a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub collection: &'static str,
    pub candidates: CandidateSet,
    pub search: Option<SearchFilter>,
}

impl FilterSpec {
    pub fn new(collection: &'static str, candidates: CandidateSet) -> Self {
        Self {
            collection,
            candidates,
            search: None,
        }
    }

    /// Whether a record drawn from the candidate set passes the search.
    pub fn admits<R: RecordView>(&self, record: &R) -> bool {
        self.search
            .as_ref()
            .map_or(true, |search| search.matches(record))
    }
}

/// Exclusive `after`/`before` boundaries, compared in `order`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    /// The forward order of the connection
    pub order: SortOrder,
    pub after: Option<Record>,
    pub before: Option<Record>,
}

impl Bounds {
    pub fn unbounded(order: SortOrder) -> Self {
        Self {
            order,
            after: None,
            before: None,
        }
    }

    pub fn admits<R: RecordView>(&self, record: &R) -> bool {
        let after_ok = self
            .after
            .as_ref()
            .map_or(true, |after| self.order.compare(record, after) == Ordering::Greater);
        let before_ok = self
            .before
            .as_ref()
            .map_or(true, |before| self.order.compare(record, before) == Ordering::Less);
        after_ok && before_ok
    }
}

/// A boundable, ordered plan for one page
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub tag: &'static str,
    pub filter: FilterSpec,
    pub bounds: Bounds,
    pub direction: Direction,
    pub limit: usize,
}

impl QueryPlan {
    /// The canonical forward order of the connection.
    pub fn order(&self) -> &SortOrder {
        &self.bounds.order
    }

    /// The order the window is fetched in.
    ///
    /// Backward pages fetch in reverse so the limit keeps the records closest
    /// to the `before` boundary.
    pub fn fetch_order(&self) -> SortOrder {
        match self.direction {
            Direction::Forward => self.bounds.order.clone(),
            Direction::Backward => self.bounds.order.reversed(),
        }
    }
}

pub struct QueryPlanBuilder<'a> {
    config: &'a DomainConfig,
    store: &'a dyn Store,
}

impl<'a> QueryPlanBuilder<'a> {
    pub fn new(config: &'a DomainConfig, store: &'a dyn Store) -> Self {
        Self { config, store }
    }

    pub async fn build(
        &self,
        request: &PageRequest,
        candidates: CandidateSet,
    ) -> Result<QueryPlan, ConnectionError> {
        let order = match &request.order_by {
            Some(spec) => SortOrder::by_field(&spec.field, spec.direction, self.config.extractor()),
            None => SortOrder::by_key(self.config.extractor()),
        };

        let mut filter = FilterSpec::new(self.config.collection(), candidates);
        if let Some(term) = &request.search {
            if self.config.search_fields().is_empty() {
                tracing::debug!(
                    connection = self.config.name(),
                    "search ignored, connection has no searchable fields"
                );
            } else {
                filter.search = Some(SearchFilter::new(term, self.config.search_fields()));
            }
        }

        let needs_document = request.order_by.is_some();
        let after = self
            .reference(Argument::After, request.after_key.as_deref(), needs_document)
            .await?;
        let before = self
            .reference(Argument::Before, request.before_key.as_deref(), needs_document)
            .await?;

        Ok(QueryPlan {
            tag: self.config.tag(),
            filter,
            bounds: Bounds {
                order,
                after,
                before,
            },
            direction: request.direction,
            limit: request.limit,
        })
    }

    /// Key order compares keys only, so the cursor itself is the boundary.
    /// Field order needs the referenced document's field value, which may lie
    /// outside the candidate set.
    async fn reference(
        &self,
        argument: Argument,
        key: Option<&str>,
        needs_document: bool,
    ) -> Result<Option<Record>, ConnectionError> {
        let Some(key) = key else {
            return Ok(None);
        };
        if !needs_document {
            return Ok(Some(Record::new(key, Value::Null)));
        }

        match self
            .store
            .resolve_by_key(self.config.collection(), key)
            .await?
        {
            Some(record) => Ok(Some(record)),
            None => Err(ConnectionError::InvalidCursor {
                argument,
                source: CursorError::UnknownRecord(key.to_string()),
            }),
        }
    }
}
