//! Rejection diagnostics
//!
//! Every rejected pagination call emits exactly one [`Diagnostic`] naming
//! the caller and the offending argument before the error is returned.

use std::sync::{Mutex, PoisonError};

use crate::ConnectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub caller: String,
    pub loader: &'static str,
    pub message: String,
}

impl Diagnostic {
    /// Describe a rejection of `caller`'s call to `loader`.
    ///
    /// `collection` is only used by store failures.
    pub fn for_error(
        error: &ConnectionError,
        caller: &str,
        loader: &'static str,
        collection: &str,
    ) -> Self {
        let (level, message) = match error {
            ConnectionError::MissingLimit => (
                Level::Warn,
                format!("User: {caller} did not have either `first` or `last` arguments set for: {loader}."),
            ),
            ConnectionError::ConflictingLimit => (
                Level::Warn,
                format!("User: {caller} attempted to have `first` and `last` arguments set for: {loader}."),
            ),
            ConnectionError::InvalidLimitType { argument, type_name } => (
                Level::Warn,
                format!("User: {caller} attempted to have `{argument}` set as a {type_name} for: {loader}."),
            ),
            ConnectionError::NegativeLimit { argument } => (
                Level::Warn,
                format!("User: {caller} attempted to have `{argument}` set below zero for: {loader}."),
            ),
            ConnectionError::LimitTooLarge { argument, amount, .. } => (
                Level::Warn,
                format!("User: {caller} attempted to have `{argument}` set to {amount} for: {loader}."),
            ),
            ConnectionError::InvalidCursor { argument, source } => (
                Level::Warn,
                format!(
                    "User: {caller} supplied an invalid `{argument}` cursor for: {loader}, error: {source}."
                ),
            ),
            ConnectionError::UnknownOrderField(field) => (
                Level::Warn,
                format!("User: {caller} attempted to order by unknown field `{field}` for: {loader}."),
            ),
            ConnectionError::StoreFailure(cause) => (
                Level::Error,
                format!(
                    "Database error occurred while user: {caller} was trying to gather {collection} in {loader}, error: {cause}"
                ),
            ),
        };

        Self {
            level,
            caller: caller.to_string(),
            loader,
            message,
        }
    }
}

/// Receives rejection diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        match diagnostic.level {
            Level::Warn => tracing::warn!(
                caller = %diagnostic.caller,
                loader = diagnostic.loader,
                "{}",
                diagnostic.message
            ),
            Level::Error => tracing::error!(
                caller = %diagnostic.caller,
                loader = diagnostic.loader,
                "{}",
                diagnostic.message
            ),
        }
    }
}

/// Keeps diagnostics in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics().into_iter().map(|d| d.message).collect()
    }

    pub fn clear(&self) {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: &Diagnostic) {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Argument;
    use crate::store::StoreError;

    #[test]
    fn test_limit_diagnostic_lines() {
        let line = |error: ConnectionError| {
            let loader = "domainLoaderConnectionsByUserId";
            Diagnostic::for_error(&error, "1234", loader, "domains").message
        };

        assert_eq!(
            line(ConnectionError::MissingLimit),
            "User: 1234 did not have either `first` or `last` arguments set for: domainLoaderConnectionsByUserId."
        );
        assert_eq!(
            line(ConnectionError::LimitTooLarge {
                argument: Argument::Last,
                amount: 1000,
                max: 100,
            }),
            "User: 1234 attempted to have `last` set to 1000 for: domainLoaderConnectionsByUserId."
        );
        assert_eq!(
            line(ConnectionError::InvalidLimitType {
                argument: Argument::First,
                type_name: "string",
            }),
            "User: 1234 attempted to have `first` set as a string for: domainLoaderConnectionsByUserId."
        );
    }

    #[test]
    fn test_store_failure_is_error_level() {
        let diagnostic = Diagnostic::for_error(
            &ConnectionError::StoreFailure(StoreError::Query("connection reset".to_string())),
            "1234",
            "loadDomainsByUser",
            "domains",
        );
        assert_eq!(diagnostic.level, Level::Error);
        assert_eq!(
            diagnostic.message,
            "Database error occurred while user: 1234 was trying to gather domains in loadDomainsByUser, error: query failed: connection reset"
        );
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        for error in [ConnectionError::MissingLimit, ConnectionError::ConflictingLimit] {
            sink.emit(&Diagnostic::for_error(&error, "u", "loader", "c"));
        }
        assert_eq!(sink.diagnostics().len(), 2);
        assert!(sink.messages()[1].contains("`first` and `last`"));
        sink.clear();
        assert!(sink.messages().is_empty());
        let missing = ConnectionError::MissingLimit;
        TracingSink.emit(&Diagnostic::for_error(&missing, "u", "loader", "c"));
    }
}
