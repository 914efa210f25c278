//! Collaborator traits the harness calls into.
//!
//! `Fetcher` retrieves and extracts content for one key, `TaskSource` lists
//! the keys of a run, and `RecordSink` persists the optional per-key record.

use std::collections::HashSet;

use tracing::warn;

use crate::error::{FetchError, StrategyError};
use crate::types::WorkItem;

/// Content-retrieval and extraction collaborator.
pub trait Fetcher: Send + Sync {
    /// Retrieve and extract the payload for `key`.
    fn fetch(&self, key: &str) -> Result<String, FetchError>;

    /// Human-readable name of this fetcher.
    fn name(&self) -> &str;

    /// Whether `fetch` may be called from several threads at once.
    ///
    /// Strategies that share one fetcher across threads serialize calls
    /// when this returns `false`.
    fn is_thread_safe(&self) -> bool {
        true
    }
}

/// Produces the ordered keys of a run.
pub trait TaskSource: Send + Sync {
    /// Return at most `limit` unique keys, in source order.
    fn list_keys(&self, limit: usize) -> Result<Vec<String>, FetchError>;

    /// Human-readable name of this source.
    fn name(&self) -> &str;
}

/// Best-effort persistence of one fetched payload.
pub trait RecordSink: Send + Sync {
    /// Persist the payload fetched for `key`.
    fn record(&self, key: &str, payload: &str) -> std::io::Result<()>;
}

/// Record sink that discards everything.
pub struct NoOpRecordSink;

impl RecordSink for NoOpRecordSink {
    fn record(&self, _key: &str, _payload: &str) -> std::io::Result<()> {
        Ok(())
    }
}

/// Ask `source` for up to `limit` keys and turn them into work items.
///
/// Empty and repeated keys are dropped so that every item is dispatched
/// exactly once.
pub fn collect_work_items(
    source: &dyn TaskSource,
    limit: usize,
) -> Result<Vec<WorkItem>, StrategyError> {
    let keys = source
        .list_keys(limit)
        .map_err(|e| StrategyError::TaskSource(format!("{}: {e}", source.name())))?;

    let mut seen = HashSet::with_capacity(keys.len());
    let mut items = Vec::with_capacity(keys.len().min(limit));
    for key in keys {
        if items.len() == limit {
            break;
        }
        if !seen.insert(key.clone()) {
            warn!(source = source.name(), key = %key, "Dropping duplicate key");
            continue;
        }
        match WorkItem::new(key) {
            Some(item) => items.push(item),
            None => warn!(source = source.name(), "Dropping empty key"),
        }
    }
    Ok(items)
}
