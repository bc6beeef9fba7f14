//! Sort keys and comparators
//!
//! Every connection is ordered by a [`SortOrder`]: an optional requested
//! field followed by the record key's numeric suffix and then the full key.
//! The trailing key columns make the order total, so a cursor always names
//! exactly one position.

use std::cmp::Ordering;

use async_graphql::Enum;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::RecordView;

/// Requested ordering direction
#[derive(Enum, Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn reverse(self) -> Self {
        match self {
            OrderDirection::Asc => OrderDirection::Desc,
            OrderDirection::Desc => OrderDirection::Asc,
        }
    }

    /// Orient an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// How values of an orderable field compare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    /// RFC 3339 date-time strings, compared as instants
    Timestamp,
    Boolean,
}

/// An entry of a domain's order-field allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFieldDef {
    /// External name, as accepted in `orderBy.field` (e.g. `tag-name`)
    pub name: &'static str,
    /// Dot-separated document path (e.g. `categoryTotals.fail`)
    pub path: &'static str,
    pub kind: ValueKind,
}

/// Extracts the numeric tie-break from a record key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyExtractor {
    /// `<prefix><integer>` keys such as `dkim12`
    #[default]
    TrailingDigits,
    /// Keys that are a plain integer
    Numeric,
}

impl KeyExtractor {
    /// Keys without a usable number have suffix 0.
    pub fn extract(self, key: &str) -> KeySuffix {
        let digits = match self {
            KeyExtractor::TrailingDigits => {
                let run = key.bytes().rev().take_while(u8::is_ascii_digit).count();
                &key[key.len() - run..]
            }
            KeyExtractor::Numeric if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) => {
                key
            }
            KeyExtractor::Numeric => "",
        };
        KeySuffix(digits.trim_start_matches('0').to_string())
    }
}

/// The integer suffix of a key as decimal digits without leading zeros.
///
/// Ordered by digit count, then digits, so any length compares exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySuffix(String);

impl KeySuffix {
    pub fn digits(&self) -> &str {
        if self.0.is_empty() {
            "0"
        } else {
            &self.0
        }
    }
}

impl PartialOrd for KeySuffix {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeySuffix {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

/// What a sort key reads from a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSource {
    Field { path: &'static str, kind: ValueKind },
    KeySuffix(KeyExtractor),
    Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub source: SortSource,
    pub direction: OrderDirection,
}

impl SortKey {
    pub fn value<R: RecordView>(&self, record: &R) -> SortValue {
        match self.source {
            SortSource::Field { path, kind } => SortValue::from_json(record.get(path), kind),
            SortSource::KeySuffix(extractor) => SortValue::Suffix(extractor.extract(record.key())),
            SortSource::Key => SortValue::Text(record.key().to_string()),
        }
    }

    pub fn compare<A: RecordView, B: RecordView>(&self, a: &A, b: &B) -> Ordering {
        self.direction.apply(self.value(a).cmp(&self.value(b)))
    }
}

/// A value extracted for comparison.
///
/// Variants are ranked `Missing < Bool < Number < Suffix < Time < Text` so
/// that mixed data still has a deterministic order; within a well-typed field
/// only `Missing` ever meets another variant. Strings in a `Number` field stay
/// text and rank after every number.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Missing,
    Bool(bool),
    Number(f64),
    Suffix(KeySuffix),
    Time(DateTime<FixedOffset>),
    Text(String),
}

impl SortValue {
    pub fn from_json(value: Option<&Value>, kind: ValueKind) -> Self {
        let value = match value {
            None | Some(Value::Null) => return SortValue::Missing,
            Some(value) => value,
        };

        match (kind, value) {
            (ValueKind::Boolean, Value::Bool(b)) => SortValue::Bool(*b),
            (ValueKind::Number, Value::Number(n)) => {
                n.as_f64().map_or(SortValue::Missing, SortValue::Number)
            }
            (ValueKind::Timestamp, Value::String(s)) => match DateTime::parse_from_rfc3339(s) {
                Ok(time) => SortValue::Time(time),
                Err(_) => SortValue::Text(s.clone()),
            },
            (_, Value::String(s)) => SortValue::Text(s.clone()),
            (_, Value::Bool(b)) => SortValue::Bool(*b),
            (_, Value::Number(n)) => n.as_f64().map_or(SortValue::Missing, SortValue::Number),
            (_, other) => SortValue::Text(other.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Missing => 0,
            SortValue::Bool(_) => 1,
            SortValue::Number(_) => 2,
            SortValue::Suffix(_) => 3,
            SortValue::Time(_) => 4,
            SortValue::Text(_) => 5,
        }
    }
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
            (SortValue::Bool(a), SortValue::Bool(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Suffix(a), SortValue::Suffix(b)) => a.cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// The effective order of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    keys: Vec<SortKey>,
}

impl SortOrder {
    /// Key suffix ascending, then key ascending.
    pub fn by_key(extractor: KeyExtractor) -> Self {
        Self {
            keys: vec![
                SortKey {
                    source: SortSource::KeySuffix(extractor),
                    direction: OrderDirection::Asc,
                },
                SortKey {
                    source: SortSource::Key,
                    direction: OrderDirection::Asc,
                },
            ],
        }
    }

    /// The requested field first; ties fall back to the key order, ascending
    /// regardless of `direction`.
    pub fn by_field(
        field: &OrderFieldDef,
        direction: OrderDirection,
        extractor: KeyExtractor,
    ) -> Self {
        let mut order = Self::by_key(extractor);
        order.keys.insert(
            0,
            SortKey {
                source: SortSource::Field {
                    path: field.path,
                    kind: field.kind,
                },
                direction,
            },
        );
        order
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn reversed(&self) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .map(|key| SortKey {
                    source: key.source,
                    direction: key.direction.reverse(),
                })
                .collect(),
        }
    }

    pub fn compare<A: RecordView, B: RecordView>(&self, a: &A, b: &B) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    pub fn sort<R: RecordView>(&self, records: &mut [R]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Record;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(key: &str, doc: Value) -> Record {
        Record::new(key, doc)
    }

    #[test]
    fn test_trailing_digits_extractor() {
        assert_eq!(KeyExtractor::TrailingDigits.extract("dkim12").digits(), "12");
        assert_eq!(KeyExtractor::TrailingDigits.extract("a1").digits(), "1");
        assert_eq!(KeyExtractor::TrailingDigits.extract("345").digits(), "345");
        assert_eq!(KeyExtractor::TrailingDigits.extract("tag").digits(), "0");
        assert_eq!(KeyExtractor::TrailingDigits.extract("tag007").digits(), "7");
        assert_eq!(KeyExtractor::Numeric.extract("77").digits(), "77");
        assert_eq!(KeyExtractor::Numeric.extract("x7").digits(), "0");
    }

    #[test]
    fn test_key_order_is_numeric_not_lexical() {
        let order = SortOrder::by_key(KeyExtractor::TrailingDigits);
        let mut records = vec![
            record("tag10", json!({})),
            record("tag2", json!({})),
            record("tag1", json!({})),
        ];
        order.sort(&mut records);
        let keys: Vec<_> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["tag1", "tag2", "tag10"]);
    }

    #[test]
    fn test_suffix_wider_than_u64_sorts_last() {
        let order = SortOrder::by_key(KeyExtractor::TrailingDigits);
        let mut records = vec![
            record("tag99999999999999999999", json!({})),
            record("tag2", json!({})),
            record("tag1", json!({})),
        ];
        order.sort(&mut records);
        let keys: Vec<_> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["tag1", "tag2", "tag99999999999999999999"]);
    }

    #[test]
    fn test_field_order_breaks_ties_by_key_ascending() {
        let field = OrderFieldDef {
            name: "fail-count",
            path: "totals.fail",
            kind: ValueKind::Number,
        };
        let order = SortOrder::by_field(&field, OrderDirection::Desc, KeyExtractor::TrailingDigits);
        let mut records = vec![
            record("s3", json!({"totals": {"fail": 5}})),
            record("s1", json!({"totals": {"fail": 5}})),
            record("s2", json!({"totals": {"fail": 9}})),
            record("s4", json!({})),
        ];
        order.sort(&mut records);
        let keys: Vec<_> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["s2", "s1", "s3", "s4"]);
    }

    #[test]
    fn test_reversed_flips_every_key() {
        let order = SortOrder::by_key(KeyExtractor::TrailingDigits);
        let a = record("a1", json!({}));
        let b = record("a2", json!({}));
        assert_eq!(order.compare(&a, &b), Ordering::Less);
        assert_eq!(order.reversed().compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_timestamps_compare_as_instants() {
        let timestamp = |raw: &str| SortValue::from_json(Some(&json!(raw)), ValueKind::Timestamp);
        let earlier = timestamp("2021-01-01T12:00:00+02:00");
        let later = timestamp("2021-01-01T11:00:00Z");
        assert!(earlier < later);
    }

    #[test]
    fn test_missing_sorts_first() {
        let missing = SortValue::from_json(None, ValueKind::Text);
        let null = SortValue::from_json(Some(&Value::Null), ValueKind::Text);
        let text = SortValue::from_json(Some(&json!("a")), ValueKind::Text);
        assert_eq!(missing, null);
        assert!(missing < text);
    }

    #[test]
    fn test_numeric_strings_rank_as_text() {
        let number = |v: Value| SortValue::from_json(Some(&v), ValueKind::Number);
        assert!(number(json!("10")) < number(json!("9")));
        assert!(number(json!("1")) > number(json!(1000)));
        assert!(number(json!(10)) > number(json!(9)));
    }

    proptest! {
        #[test]
        fn suffix_order_matches_integer_order(
            a in any::<u128>(),
            b in any::<u128>(),
            zeros in 0usize..3,
        ) {
            let pad = "0".repeat(zeros);
            let left = KeyExtractor::TrailingDigits.extract(&format!("dkim{pad}{a}"));
            let right = KeyExtractor::TrailingDigits.extract(&format!("spf{b}"));
            prop_assert_eq!(left.cmp(&right), a.cmp(&b));
            prop_assert_eq!(KeyExtractor::Numeric.extract(&format!("{pad}{a}")), left);
        }
    }
}
