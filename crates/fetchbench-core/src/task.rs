//! The Fetch Task: one key in, one `FetchResult` out.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::fetcher::{Fetcher, NoOpRecordSink, RecordSink};
use crate::types::{FetchResult, WorkItem};

/// Pure unit of work wrapping a fetcher and an optional record sink.
///
/// `execute` never fails: errors and panics from the fetcher are turned
/// into `FetchResult::Err`.
#[derive(Clone)]
pub struct FetchTask {
    fetcher: Arc<dyn Fetcher>,
    records: Arc<dyn RecordSink>,
}

impl FetchTask {
    /// Create a task that does not persist per-key records.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            records: Arc::new(NoOpRecordSink),
        }
    }

    /// Attach a record sink written after every successful fetch.
    #[must_use]
    pub fn with_records(mut self, records: Arc<dyn RecordSink>) -> Self {
        self.records = records;
        self
    }

    /// The fetcher this task calls.
    #[must_use]
    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// Fetch one work item.
    pub fn execute(&self, item: &WorkItem) -> FetchResult {
        let key = item.key();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.fetcher.fetch(key)))
            .unwrap_or_else(|payload| Err(FetchError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(payload) => {
                if let Err(e) = self.records.record(key, &payload) {
                    warn!(key, error = %e, "Failed to write per-key record");
                }
                debug!(key, bytes = payload.len(), "Fetch succeeded");
                FetchResult::Ok {
                    key: key.to_string(),
                    payload,
                }
            }
            Err(e) => {
                debug!(key, error = %e, "Fetch failed");
                FetchResult::Err {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
