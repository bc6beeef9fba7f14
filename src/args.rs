//! Connection arguments and their validation
//!
//! Follows the Relay Cursor Connections Specification:
//! https://relay.dev/graphql/connections.htm

use std::fmt;

use async_graphql::InputObject;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::{DomainConfig, EngineConfig};
use crate::cursor::{cleanse, CursorCodec};
use crate::order::{OrderDirection, OrderFieldDef};
use crate::ConnectionError;

/// Requested ordering, as received from the caller
#[derive(InputObject, Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: OrderDirection,
}

/// Pagination arguments exactly as received at the API boundary.
///
/// `first` and `last` stay untyped so a wrongly typed limit can be reported
/// with its runtime type. An explicit `null` counts as supplied.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionArgs {
    #[serde(default, deserialize_with = "present")]
    pub first: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub last: Option<Value>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub order_by: Option<OrderBy>,
    pub search: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ConnectionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first(mut self, first: i64) -> Self {
        self.first = Some(Value::from(first));
        self
    }

    pub fn last(mut self, last: i64) -> Self {
        self.last = Some(Value::from(last));
        self
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Build from typed GraphQL arguments.
    pub fn from_graphql(
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
        order_by: Option<OrderBy>,
        search: Option<String>,
    ) -> Self {
        Self {
            first: first.map(Value::from),
            last: last.map(Value::from),
            after,
            before,
            order_by,
            search,
        }
    }
}

/// Names the offending argument in errors and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    First,
    Last,
    After,
    Before,
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Argument::First => "first",
            Argument::Last => "last",
            Argument::After => "after",
            Argument::Before => "before",
        })
    }
}

/// Pagination direction, from which of `first`/`last` was supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A validated order request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSpec {
    pub field: OrderFieldDef,
    pub direction: OrderDirection,
}

/// Normalized pagination intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub direction: Direction,
    pub limit: usize,
    pub after_key: Option<String>,
    pub before_key: Option<String>,
    pub order_by: Option<OrderSpec>,
    pub search: Option<String>,
}

/// Validates raw arguments for one domain.
pub struct ArgumentValidator<'a> {
    domain: &'a DomainConfig,
    engine: &'a EngineConfig,
}

impl<'a> ArgumentValidator<'a> {
    pub fn new(domain: &'a DomainConfig, engine: &'a EngineConfig) -> Self {
        Self { domain, engine }
    }

    /// Limit checks run in a fixed order and the first failure wins:
    /// missing, conflicting, type, negative, too large.
    pub fn validate(&self, args: &ConnectionArgs) -> Result<PageRequest, ConnectionError> {
        let (argument, raw) = match (&args.first, &args.last) {
            (None, None) => return Err(ConnectionError::MissingLimit),
            (Some(_), Some(_)) => return Err(ConnectionError::ConflictingLimit),
            (Some(first), None) => (Argument::First, first),
            (None, Some(last)) => (Argument::Last, last),
        };
        let limit = self.limit(argument, raw)?;
        let direction = match argument {
            Argument::Last => Direction::Backward,
            _ => Direction::Forward,
        };

        let order_by = match &args.order_by {
            Some(order_by) => {
                let field = self
                    .domain
                    .order_field_def(&order_by.field)
                    .ok_or_else(|| ConnectionError::UnknownOrderField(order_by.field.clone()))?;
                Some(OrderSpec {
                    field: *field,
                    direction: order_by.direction,
                })
            }
            None => None,
        };

        let after_key = self.cursor_key(Argument::After, args.after.as_deref())?;
        let before_key = self.cursor_key(Argument::Before, args.before.as_deref())?;

        let search = args
            .search
            .as_deref()
            .map(cleanse)
            .filter(|term| !term.is_empty());

        Ok(PageRequest {
            direction,
            limit,
            after_key,
            before_key,
            order_by,
            search,
        })
    }

    fn limit(&self, argument: Argument, raw: &Value) -> Result<usize, ConnectionError> {
        let amount: i128 = match raw {
            Value::Number(n) if n.is_i64() || n.is_u64() => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .unwrap_or_default(),
            other => {
                return Err(ConnectionError::InvalidLimitType {
                    argument,
                    type_name: json_type_name(other),
                })
            }
        };

        if amount < 0 {
            return Err(ConnectionError::NegativeLimit { argument });
        }
        if amount > i128::from(self.engine.max_limit) {
            return Err(ConnectionError::LimitTooLarge {
                argument,
                amount,
                max: self.engine.max_limit,
            });
        }
        // Bounded by max_limit above.
        Ok(amount as usize)
    }

    fn cursor_key(
        &self,
        argument: Argument,
        raw: Option<&str>,
    ) -> Result<Option<String>, ConnectionError> {
        raw.map(|cursor| {
            CursorCodec::decode_for(self.domain.tag(), cursor)
                .map_err(|source| ConnectionError::InvalidCursor { argument, source })
        })
        .transpose()
    }
}

/// Runtime type name of a non-integer limit.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorError;
    use crate::order::ValueKind;
    use serde_json::json;

    fn domain() -> DomainConfig {
        DomainConfig::new("domains", "domains")
            .order_field("domain", "domain", ValueKind::Text)
            .search_field("domain")
    }

    fn validate(args: &ConnectionArgs) -> Result<PageRequest, ConnectionError> {
        let domain = domain();
        let engine = EngineConfig::default();
        ArgumentValidator::new(&domain, &engine).validate(args)
    }

    fn from_json(value: Value) -> ConnectionArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_limit() {
        assert!(matches!(
            validate(&ConnectionArgs::new()),
            Err(ConnectionError::MissingLimit)
        ));
    }

    #[test]
    fn test_conflicting_limit_wins_over_bad_values() {
        let args = from_json(json!({"first": -1, "last": "x"}));
        assert!(matches!(validate(&args), Err(ConnectionError::ConflictingLimit)));
    }

    #[test]
    fn test_invalid_limit_types() {
        for (raw, expected) in [
            (json!("5"), "string"),
            (json!(true), "boolean"),
            (json!(1.5), "float"),
            (json!([]), "array"),
            (json!({}), "object"),
            (Value::Null, "null"),
        ] {
            let args = from_json(json!({ "first": raw }));
            match validate(&args) {
                Err(ConnectionError::InvalidLimitType { argument, type_name }) => {
                    assert_eq!(argument, Argument::First);
                    assert_eq!(type_name, expected);
                }
                other => panic!("expected type error for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_negative_limit() {
        assert!(matches!(
            validate(&ConnectionArgs::new().last(-1)),
            Err(ConnectionError::NegativeLimit {
                argument: Argument::Last
            })
        ));
    }

    #[test]
    fn test_limit_too_large() {
        match validate(&ConnectionArgs::new().first(1000)) {
            Err(ConnectionError::LimitTooLarge {
                argument,
                amount,
                max,
            }) => {
                assert_eq!(argument, Argument::First);
                assert_eq!(amount, 1000);
                assert_eq!(max, 100);
            }
            other => panic!("unexpected {other:?}"),
        }

        let huge = from_json(json!({ "first": u64::MAX }));
        assert!(matches!(
            validate(&huge),
            Err(ConnectionError::LimitTooLarge { .. })
        ));
    }

    #[test]
    fn test_normalizes_valid_request() {
        let after = CursorCodec::encode("domains", "3");
        let args = ConnectionArgs::new()
            .last(100)
            .after(format!(" {after} "))
            .order_by("domain", OrderDirection::Desc)
            .search("  gc.ca ");

        let request = validate(&args).unwrap();
        assert_eq!(request.direction, Direction::Backward);
        assert_eq!(request.limit, 100);
        assert_eq!(request.after_key.as_deref(), Some("3"));
        assert_eq!(request.before_key, None);
        assert_eq!(request.order_by.map(|o| o.field.path), Some("domain"));
        assert_eq!(request.search.as_deref(), Some("gc.ca"));
    }

    #[test]
    fn test_zero_limit_is_valid() {
        let request = validate(&ConnectionArgs::new().first(0)).unwrap();
        assert_eq!(request.limit, 0);
        assert_eq!(request.direction, Direction::Forward);
    }

    #[test]
    fn test_blank_search_is_absent() {
        let request = validate(&ConnectionArgs::new().first(1).search("   ")).unwrap();
        assert_eq!(request.search, None);
    }

    #[test]
    fn test_unknown_order_field() {
        let args = ConnectionArgs::new()
            .first(1)
            .order_by("last-ran", OrderDirection::Asc);
        assert!(matches!(
            validate(&args),
            Err(ConnectionError::UnknownOrderField(field)) if field == "last-ran"
        ));
    }

    #[test]
    fn test_foreign_cursor_rejected() {
        let args = ConnectionArgs::new()
            .first(1)
            .before(CursorCodec::encode("organizations", "1"));
        match validate(&args) {
            Err(ConnectionError::InvalidCursor { argument, source }) => {
                assert_eq!(argument, Argument::Before);
                assert!(matches!(source, CursorError::TagMismatch { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_deserializes_boundary_json() {
        let args = from_json(json!({
            "first": 5,
            "orderBy": {"field": "domain", "direction": "DESC"},
            "search": "canada"
        }));
        assert_eq!(
            args,
            ConnectionArgs::new()
                .first(5)
                .order_by("domain", OrderDirection::Desc)
                .search("canada")
        );
    }
}
