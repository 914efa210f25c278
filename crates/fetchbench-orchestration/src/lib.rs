//! # fetchbench-orchestration
//!
//! Execution strategies, result collectors, strategy selection, and the
//! trial runner that turns repeated runs into aggregate statistics.

pub mod collector;
pub mod harness;
pub mod interfaces;
pub mod process;
pub mod registry;
pub mod runner;
pub mod strategy;

pub use harness::Harness;
pub use interfaces::{NullReporter, ReportError, Reporter, ResultPresenter};
pub use process::{
    run_worker, worker_key_arg, IsolatedProcessStrategy, WorkerCommand, WORKER_KEY_FLAG,
};
pub use registry::{select_strategies, DefaultStrategyFactory, StrategyFactory};
pub use runner::{analyze_comparison, run_once, run_trials, Comparison, RunReport};
pub use strategy::{ExecutionStrategy, SequentialStrategy, SharedMemoryStrategy};
