//! # tracker-connections
//!
//! Cursor-based connection pagination for the Tracker dashboard API.
//!
//! ## Features
//!
//! - **Argument validation** - `first`/`last`/`after`/`before`/`orderBy`/`search`
//! - **Total ordering** - requested field, then numeric key suffix, then key
//! - **Page windows** - bounded fetch plus `LIMIT 1` existence checks for page flags
//! - **Localized errors** - English and French, with one diagnostic per rejection
//! - **Store adapters** - in-memory store and AQL rendering for document stores
//! - **GraphQL glue** - connection objects and an axum handler
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tracker_connections::{
//!     domains, CandidateSet, Caller, ConnectionArgs, MemoryStore, Paginator,
//! };
//!
//! # async fn example() -> Result<(), tracker_connections::PaginationError> {
//! let paginator = Paginator::new(Arc::new(MemoryStore::new()), domains::guidance_tags());
//! let page = paginator
//!     .paginate::<domains::GuidanceTag>(
//!         &Caller::new("1"),
//!         CandidateSet::keys(["dkim1", "dkim2"]),
//!         &ConnectionArgs::new().first(10),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod aql;
pub mod args;
pub mod config;
pub mod context;
pub mod cursor;
pub mod diagnostics;
pub mod domains;
pub mod engine;
pub mod executor;
pub mod i18n;
pub mod memory;
pub mod order;
pub mod pagination;
pub mod plan;
pub mod store;

pub use args::{Argument, ConnectionArgs, Direction, OrderBy, PageRequest};
pub use config::{DomainConfig, EngineConfig};
pub use context::{caller, graphql_handler};
pub use cursor::{Cursor, CursorCodec, CursorError};
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, TracingSink};
pub use engine::{Caller, Paginator};
pub use i18n::{Catalog, Locale, Localizer, MessageKey};
pub use memory::MemoryStore;
pub use order::{OrderDirection, ValueKind};
pub use pagination::{Connection, Edge, PageInfo};
pub use store::{CandidateSet, Record, Store, StoreError};

use thiserror::Error;

/// Why a pagination call was rejected
///
/// `Display` is diagnostic English; callers see [`PaginationError`] instead.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("neither `first` nor `last` was supplied")]
    MissingLimit,

    #[error("both `first` and `last` were supplied")]
    ConflictingLimit,

    #[error("`{argument}` must be an integer, got {type_name}")]
    InvalidLimitType {
        argument: Argument,
        type_name: &'static str,
    },

    #[error("`{argument}` cannot be negative")]
    NegativeLimit { argument: Argument },

    #[error("`{argument}` of {amount} exceeds the limit of {max}")]
    LimitTooLarge {
        argument: Argument,
        amount: i128,
        max: i64,
    },

    #[error("invalid `{argument}` cursor: {source}")]
    InvalidCursor {
        argument: Argument,
        source: CursorError,
    },

    #[error("unknown order field `{0}`")]
    UnknownOrderField(String),

    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl ConnectionError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ConnectionError::MissingLimit => "MISSING_LIMIT",
            ConnectionError::ConflictingLimit => "CONFLICTING_LIMIT",
            ConnectionError::InvalidLimitType { .. } => "INVALID_LIMIT_TYPE",
            ConnectionError::NegativeLimit { .. } => "NEGATIVE_LIMIT",
            ConnectionError::LimitTooLarge { .. } => "LIMIT_TOO_LARGE",
            ConnectionError::InvalidCursor { .. } => "INVALID_CURSOR",
            ConnectionError::UnknownOrderField(_) => "UNKNOWN_ORDER_FIELD",
            ConnectionError::StoreFailure(_) => "STORE_FAILURE",
        }
    }

    /// Message key and positional arguments for the user-facing text.
    ///
    /// Store failures never pass the store's own error text along.
    pub fn message(&self, connection: &str) -> (MessageKey, Vec<String>) {
        let connection = connection.to_string();
        match self {
            ConnectionError::MissingLimit => (MessageKey::MissingLimit, vec![connection]),
            ConnectionError::ConflictingLimit => (MessageKey::ConflictingLimit, vec![connection]),
            ConnectionError::InvalidLimitType {
                argument,
                type_name,
            } => (
                MessageKey::InvalidLimitType,
                vec![argument.to_string(), type_name.to_string()],
            ),
            ConnectionError::NegativeLimit { argument } => {
                (MessageKey::NegativeLimit, vec![argument.to_string(), connection])
            }
            ConnectionError::LimitTooLarge {
                argument,
                amount,
                max,
            } => (
                MessageKey::LimitTooLarge,
                vec![
                    amount.to_string(),
                    connection,
                    argument.to_string(),
                    max.to_string(),
                ],
            ),
            ConnectionError::InvalidCursor { argument, .. } => {
                (MessageKey::InvalidCursor, vec![argument.to_string(), connection])
            }
            ConnectionError::UnknownOrderField(field) => {
                (MessageKey::UnknownOrderField, vec![connection, field.clone()])
            }
            ConnectionError::StoreFailure(_) => (MessageKey::LoadFailure, vec![connection]),
        }
    }
}

/// A rejected pagination call: the typed cause plus the caller-facing text.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct PaginationError {
    #[source]
    kind: ConnectionError,
    message: String,
}

impl PaginationError {
    pub fn new(kind: ConnectionError, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ConnectionError {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_kind(self) -> ConnectionError {
        self.kind
    }
}

/// Result type for pagination calls
pub type Result<T> = std::result::Result<T, PaginationError>;
