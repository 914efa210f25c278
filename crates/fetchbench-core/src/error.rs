//! Error types for each layer of the harness.
//!
//! Item-level failures (`FetchError`) never leave the Fetch Task: they are
//! folded into `FetchResult::Err`. Strategy-level failures (`StrategyError`)
//! abort the current trial and reach the trial runner.

/// Failure inside one content-retrieval call.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("http error: {0}")]
    Http(String),

    /// The remote answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The response could not be decoded or extracted.
    #[error("parse error: {0}")]
    Parse(String),

    /// The requested key does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// The fetcher panicked.
    #[error("fetcher panicked: {0}")]
    Panicked(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Failure of the orchestration itself. Fatal to the current trial.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// The task source could not produce keys.
    #[error("task source failed: {0}")]
    TaskSource(String),

    /// A worker (thread or process) could not be started.
    #[error("failed to spawn worker: {0}")]
    Spawn(String),

    /// The result channel could not be set up or closed early.
    #[error("result channel error: {0}")]
    Channel(String),

    /// The result collector lost or duplicated results.
    #[error("result collector error: {0}")]
    Collector(String),

    /// A worker could not be joined.
    #[error("worker failure: {0}")]
    Worker(String),

    /// A run tried to move between phases out of order.
    #[error("invalid phase transition: {0}")]
    Phase(String),

    /// Invalid strategy or workload configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure of a whole `run_trials` batch.
#[derive(Debug, thiserror::Error)]
pub enum TrialError {
    /// Zero trials were requested.
    #[error("trial count must be at least 1")]
    InvalidTrialCount,

    /// Every trial failed at the strategy level.
    #[error("all {attempted} trials of {strategy} failed; last error: {last}")]
    NoSuccessfulTrials {
        strategy: String,
        attempted: usize,
        last: StrategyError,
    },

    /// The batch could not start.
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}
