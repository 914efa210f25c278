//! # fetchbench-core
//!
//! Core library for FetchBench, a harness that runs one batch of independent
//! fetch tasks under several execution strategies and compares their
//! wall-clock time.
//!
//! This crate holds the data model, the collaborator traits, the Fetch Task,
//! run observers, and the statistics used by the trial runner.

pub mod constants;
pub mod error;
pub mod fetcher;
pub mod observer;
pub mod stats;
pub mod task;
pub mod types;

// Re-exports
pub use constants::{exit_codes, DEFAULT_ITEM_COUNT, DEFAULT_PAYLOAD_SIZE, DEFAULT_TRIAL_COUNT};
pub use error::{FetchError, StrategyError, TrialError};
pub use fetcher::{collect_work_items, Fetcher, NoOpRecordSink, RecordSink, TaskSource};
pub use observer::{
    LoggingObserver, NoOpObserver, ObserverSet, Phase, PhaseTracker, RunObserver,
};
pub use task::FetchTask;
pub use types::{AggregateStats, FetchResult, StrategyKind, TrialResult, WorkItem, WorkloadParams};
