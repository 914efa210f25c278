//! Orchestration interfaces.

use fetchbench_core::types::AggregateStats;

use crate::runner::Comparison;

/// Failure to persist an aggregate row.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report encoding error: {0}")]
    Csv(String),
}

/// Durable, append-only store of aggregate rows.
pub trait Reporter: Send + Sync {
    /// Append one row. A header is written first if the store is new.
    fn append_row(&self, stats: &AggregateStats) -> Result<(), ReportError>;
}

/// Trait for presenting results to the user.
pub trait ResultPresenter: Send + Sync {
    /// Present the aggregate of one strategy.
    fn present_aggregate(&self, stats: &AggregateStats);

    /// Present the cross-strategy comparison.
    fn present_comparison(&self, comparisons: &[Comparison]);

    /// Present an error.
    fn present_error(&self, error: &str);
}

/// Null reporter (does nothing).
pub struct NullReporter;

impl Reporter for NullReporter {
    fn append_row(&self, _stats: &AggregateStats) -> Result<(), ReportError> {
        Ok(())
    }
}
