//! The pagination engine
//!
//! `validate -> plan -> execute -> assemble`. Each stage fails fast; a
//! rejected call emits one diagnostic, returns one localized error and never
//! a partial connection. Validation failures happen before any store read.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::Instrument;
use uuid::Uuid;

use crate::args::{ArgumentValidator, ConnectionArgs};
use crate::config::{DomainConfig, EngineConfig};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::executor::PageWindowExecutor;
use crate::i18n::{Catalog, Locale, Localizer};
use crate::pagination::{Connection, ResultAssembler};
use crate::plan::QueryPlanBuilder;
use crate::store::{CandidateSet, Record, Store, StoreError};
use crate::{ConnectionError, PaginationError};

/// Who is paginating, and in which language errors should be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub key: String,
    pub locale: Locale,
}

impl Caller {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            locale: Locale::default(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}

/// One connection type over one store.
pub struct Paginator<S> {
    store: Arc<S>,
    config: DomainConfig,
    engine: EngineConfig,
    localizer: Arc<dyn Localizer>,
    sink: Arc<dyn DiagnosticSink>,
}

impl<S> Clone for Paginator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            engine: self.engine.clone(),
            localizer: self.localizer.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<S: Store> Paginator<S> {
    pub fn new(store: Arc<S>, config: DomainConfig) -> Self {
        Self {
            store,
            config,
            engine: EngineConfig::default(),
            localizer: Arc::new(Catalog),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    /// Paginate and deserialize each node into `N`.
    ///
    /// A document that does not deserialize is reported as a store failure.
    pub async fn paginate<N: DeserializeOwned>(
        &self,
        caller: &Caller,
        candidates: CandidateSet,
        args: &ConnectionArgs,
    ) -> Result<Connection<N>, PaginationError> {
        let connection = self.paginate_records(caller, candidates, args).await?;
        connection
            .try_map(|record| {
                serde_json::from_value(record.document).map_err(|e| StoreError::Malformed {
                    key: record.key,
                    reason: e.to_string(),
                })
            })
            .map_err(|e| self.reject(caller, ConnectionError::StoreFailure(e)))
    }

    /// Paginate without interpreting the documents.
    pub async fn paginate_records(
        &self,
        caller: &Caller,
        candidates: CandidateSet,
        args: &ConnectionArgs,
    ) -> Result<Connection<Record>, PaginationError> {
        let span = tracing::info_span!(
            "paginate",
            connection = self.config.name(),
            caller = %caller.key,
            request_id = %Uuid::new_v4(),
        );

        async move {
            let request = ArgumentValidator::new(&self.config, &self.engine)
                .validate(args)
                .map_err(|e| self.reject(caller, e))?;

            let store: &dyn Store = self.store.as_ref();
            let plan = QueryPlanBuilder::new(&self.config, store)
                .build(&request, candidates)
                .await
                .map_err(|e| self.reject(caller, e))?;

            let window = PageWindowExecutor::new(store)
                .snapshot_reads(self.engine.snapshot_reads)
                .timeout(self.engine.store_timeout())
                .execute(&plan)
                .await
                .map_err(|e| self.reject(caller, ConnectionError::StoreFailure(e)))?;

            tracing::debug!(
                edges = window.records.len(),
                total = window.total_count,
                "page window fetched"
            );
            Ok::<_, PaginationError>(ResultAssembler::new(self.config.tag()).assemble(window))
        }
        .instrument(span)
        .await
    }

    /// Emit the diagnostic, then localize.
    fn reject(&self, caller: &Caller, error: ConnectionError) -> PaginationError {
        self.sink.emit(&Diagnostic::for_error(
            &error,
            &caller.key,
            self.config.loader(),
            self.config.collection(),
        ));
        let (key, args) = error.message(self.config.name());
        let message = self.localizer.localize(caller.locale, key, &args);
        PaginationError::new(error, message)
    }
}
