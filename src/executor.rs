//! Page window execution
//!
//! One call issues at most four reads: the window and the total count, then
//! the two `LIMIT 1` existence checks for the page flags. When the store offers a
//! snapshot all four go through it; otherwise each read sees the data as of
//! when it was issued, and a concurrent writer can make a page flag stale.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::args::Direction;
use crate::plan::QueryPlan;
use crate::store::{Record, Store, StoreError};

/// The records of one page in forward order, plus boundary metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawWindow {
    pub records: Vec<Record>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub total_count: u64,
}

pub struct PageWindowExecutor<'a> {
    store: &'a dyn Store,
    snapshot_reads: bool,
    timeout: Option<Duration>,
}

impl<'a> PageWindowExecutor<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            snapshot_reads: true,
            timeout: None,
        }
    }

    pub fn snapshot_reads(mut self, enabled: bool) -> Self {
        self.snapshot_reads = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn execute(&self, plan: &QueryPlan) -> Result<RawWindow, StoreError> {
        let snapshot: Option<Arc<dyn Store>> = if self.snapshot_reads {
            self.bounded(self.store.snapshot()).await?
        } else {
            None
        };
        let store: &dyn Store = match snapshot.as_deref() {
            Some(pinned) => pinned,
            None => self.store,
        };

        let fetch_order = plan.fetch_order();
        let (mut records, total_count) = tokio::try_join!(
            self.bounded(store.fetch_window(&plan.filter, &fetch_order, &plan.bounds, plan.limit)),
            self.bounded(store.count(&plan.filter)),
        )?;

        if plan.direction == Direction::Backward {
            records.reverse();
        }

        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            return Ok(RawWindow::default());
        };

        let order = plan.order();
        let (has_previous_page, has_next_page) = tokio::try_join!(
            self.bounded(store.exists_beyond(&plan.filter, order, first, Direction::Backward)),
            self.bounded(store.exists_beyond(&plan.filter, order, last, Direction::Forward)),
        )?;

        Ok(RawWindow {
            records,
            has_next_page,
            has_previous_page,
            total_count,
        })
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, operation)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => operation.await,
        }
    }
}
