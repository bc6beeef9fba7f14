//! AQL rendering for document/graph store adapters
//!
//! Lowers the four [`Store`](crate::store::Store) reads to parameterized
//! AQL. Document paths come from [`DomainConfig`](crate::config::DomainConfig)
//! and are quoted into the text; everything that originates from a caller
//! (keys, search terms, boundary documents, limits) is a bind variable.
//!
//! Boundary records are bound whole as `@after`/`@before`/`@boundary` and
//! compared through the same sort expressions as `doc`, so a store adapter
//! never has to look a cursor's record up again.
//!
//! A key suffix sorts as two columns, digit count then digits with leading
//! zeros trimmed, which orders integers of any width exactly.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::args::Direction;
use crate::order::{KeyExtractor, OrderDirection, SortKey, SortOrder, SortSource, ValueKind};
use crate::plan::{Bounds, FilterSpec};
use crate::store::{CandidateSet, EdgeDirection, Record};

/// A query and its bind variables
#[derive(Debug, Clone, PartialEq)]
pub struct AqlQuery {
    pub query: String,
    pub bind_vars: Map<String, Value>,
}

/// Records of `filter` strictly inside `bounds`, sorted by `order`, at most `limit`.
pub fn window(filter: &FilterSpec, order: &SortOrder, bounds: &Bounds, limit: usize) -> AqlQuery {
    let mut q = QueryText::default();
    if let Some(after) = &bounds.after {
        q.let_bound("after", after);
    }
    if let Some(before) = &bounds.before {
        q.let_bound("before", before);
    }
    q.candidates(filter);
    if bounds.after.is_some() {
        q.line(format!("FILTER {}", beyond(&bounds.order, "after", Ordering::Greater)));
    }
    if bounds.before.is_some() {
        q.line(format!("FILTER {}", beyond(&bounds.order, "before", Ordering::Less)));
    }
    q.line(sort_clause(order));
    let limit = q.bind("limit", Value::from(limit as u64));
    q.line(format!("LIMIT {limit}"));
    q.line("RETURN doc");
    q.finish()
}

/// `true` when any record of `filter` lies beyond `boundary` in `order`.
///
/// Ignores page bounds and reads at most one record.
pub fn exists_beyond(
    filter: &FilterSpec,
    order: &SortOrder,
    boundary: &Record,
    direction: Direction,
) -> AqlQuery {
    let side = match direction {
        Direction::Forward => Ordering::Greater,
        Direction::Backward => Ordering::Less,
    };
    let mut q = QueryText::default();
    q.let_bound("boundary", boundary);
    q.line("RETURN LENGTH(");
    q.candidates(filter);
    q.line(format!("FILTER {}", beyond(order, "boundary", side)));
    q.line("LIMIT 1");
    q.line("RETURN 1");
    q.line(") > 0");
    q.finish()
}

/// Size of the search-filtered candidate set.
pub fn count(filter: &FilterSpec) -> AqlQuery {
    let mut q = QueryText::default();
    q.candidates(filter);
    q.line("COLLECT WITH COUNT INTO total");
    q.line("RETURN total");
    q.finish()
}

/// A single document by key.
pub fn lookup(collection: &str, key: &str) -> AqlQuery {
    let mut q = QueryText::default();
    let collection = q.bind("@collection", Value::from(collection));
    let key = q.bind("key", Value::from(key));
    q.line(format!("FOR doc IN {collection}"));
    q.line(format!("FILTER doc._key == {key}"));
    q.line("LIMIT 1");
    q.line("RETURN doc");
    q.finish()
}

#[derive(Default)]
struct QueryText {
    lines: Vec<String>,
    bind_vars: Map<String, Value>,
}

impl QueryText {
    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Bind a value and return its placeholder.
    fn bind(&mut self, name: &str, value: Value) -> String {
        self.bind_vars.insert(name.to_string(), value);
        format!("@{name}")
    }

    /// Bind a record as a document carrying its `_key`.
    fn let_bound(&mut self, name: &str, record: &Record) {
        let mut document = match &record.document {
            Value::Object(fields) => fields.clone(),
            _ => Map::new(),
        };
        document.insert("_key".to_string(), Value::from(record.key.as_str()));
        let placeholder = self.bind(name, Value::Object(document));
        self.line(format!("LET {name} = {placeholder}"));
    }

    fn candidates(&mut self, filter: &FilterSpec) {
        let collection = self.bind("@collection", Value::from(filter.collection));
        match &filter.candidates {
            CandidateSet::All => self.line(format!("FOR doc IN {collection}")),
            CandidateSet::Keys(keys) => {
                let keys = self.bind("keys", Value::from(keys.clone()));
                self.line(format!("FOR doc IN {collection}"));
                self.line(format!("FILTER doc._key IN {keys}"));
            }
            CandidateSet::Related {
                from,
                edge_collection,
                direction,
            } => {
                let start = self.bind("start", Value::from(from.as_str()));
                let edges = self.bind("@edges", Value::from(edge_collection.as_str()));
                let target = self.bind("target", Value::from(filter.collection));
                let hop = match direction {
                    EdgeDirection::Outbound => "OUTBOUND",
                    EdgeDirection::Inbound => "INBOUND",
                };
                self.line(format!("FOR doc IN 1..1 {hop} {start} {edges}"));
                self.line(format!("FILTER IS_SAME_COLLECTION({target}, doc)"));
            }
        }

        if let Some(search) = &filter.search {
            let term = self.bind("search", Value::from(search.term.as_str()));
            let clauses: Vec<String> = search
                .fields
                .iter()
                .map(|path| {
                    format!("CONTAINS(LOWER(TO_STRING({})), {term})", attribute("doc", path))
                })
                .collect();
            self.line(format!("FILTER ({})", clauses.join(" OR ")));
        }
    }

    fn finish(self) -> AqlQuery {
        AqlQuery {
            query: self.lines.join("\n"),
            bind_vars: self.bind_vars,
        }
    }
}

fn attribute(var: &str, path: &str) -> String {
    path.split('.').fold(var.to_string(), |expr, segment| format!("{expr}.`{segment}`"))
}

fn key_digits(extractor: KeyExtractor, var: &str) -> String {
    match extractor {
        KeyExtractor::TrailingDigits => {
            format!("LTRIM(NOT_NULL(REGEX_MATCHES({var}._key, \"[0-9]*$\")[0], \"\"), \"0\")")
        }
        KeyExtractor::Numeric => {
            format!("(REGEX_TEST({var}._key, \"^[0-9]+$\") ? LTRIM({var}._key, \"0\") : \"\")")
        }
    }
}

/// The expressions one sort key compares by, most significant first.
fn sort_columns(key: &SortKey, var: &str) -> Vec<String> {
    match key.source {
        SortSource::Field { path, kind } => match kind {
            ValueKind::Timestamp => vec![format!("DATE_TIMESTAMP({})", attribute(var, path))],
            ValueKind::Text | ValueKind::Number | ValueKind::Boolean => {
                vec![attribute(var, path)]
            }
        },
        SortSource::KeySuffix(extractor) => {
            let digits = key_digits(extractor, var);
            vec![format!("LENGTH({digits})"), digits]
        }
        SortSource::Key => vec![format!("{var}._key")],
    }
}

fn sort_clause(order: &SortOrder) -> String {
    let columns: Vec<String> = order
        .keys()
        .iter()
        .flat_map(|key| {
            sort_columns(key, "doc")
                .into_iter()
                .map(move |column| format!("{column} {}", key.direction.as_str()))
        })
        .collect();
    format!("SORT {}", columns.join(", "))
}

/// Lexicographic "strictly after (`Greater`) or before (`Less`) `var`" in `order`.
fn beyond(order: &SortOrder, var: &str, side: Ordering) -> String {
    let comparisons: Vec<(String, String, &'static str)> = order
        .keys()
        .iter()
        .flat_map(|key| {
            let ascending_side = match key.direction {
                OrderDirection::Asc => side,
                OrderDirection::Desc => side.reverse(),
            };
            let op = if ascending_side == Ordering::Greater { ">" } else { "<" };
            sort_columns(key, "doc")
                .into_iter()
                .zip(sort_columns(key, var))
                .map(move |(doc, bound)| (doc, bound, op))
        })
        .collect();

    comparisons
        .iter()
        .rev()
        .fold(None, |inner: Option<String>, (doc, bound, op)| {
            Some(match inner {
                None => format!("{doc} {op} {bound}"),
                Some(inner) => format!("({doc} {op} {bound} OR ({doc} == {bound} AND {inner}))"),
            })
        })
        .unwrap_or_else(|| "true".to_string())
}
