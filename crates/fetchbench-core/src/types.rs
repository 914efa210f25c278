//! Data model shared by every execution strategy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StrategyError;

/// One identifier to fetch (an article title, a subreddit name, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    key: String,
}

impl WorkItem {
    /// Create a work item. Returns `None` for an empty key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() {
            None
        } else {
            Some(Self { key })
        }
    }

    /// The key identifying what to fetch.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Outcome of one Fetch Task invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FetchResult {
    /// The content was retrieved and extracted.
    Ok { key: String, payload: String },
    /// Retrieval or extraction failed.
    Err { key: String, message: String },
}

impl FetchResult {
    /// Key of the work item this result belongs to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Ok { key, .. } | Self::Err { key, .. } => key,
        }
    }

    /// Whether this is a successful outcome.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Whether this is a failed outcome.
    #[must_use]
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Err { .. })
    }
}

/// Parameters describing the fixed workload of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadParams {
    /// Maximum number of work items the task source may return.
    pub item_count: usize,
    /// Size target handed to the fetcher (characters, posts, or bytes
    /// depending on the source).
    pub payload_size_target: usize,
}

impl WorkloadParams {
    /// Create workload parameters.
    #[must_use]
    pub fn new(item_count: usize, payload_size_target: usize) -> Self {
        Self {
            item_count,
            payload_size_target,
        }
    }

    /// Reject parameters no source can honour.
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.payload_size_target == 0 {
            return Err(StrategyError::Config(
                "payload size target must be greater than zero".into(),
            ));
        }
        if self.item_count > crate::constants::MAX_ITEM_COUNT {
            return Err(StrategyError::Config(format!(
                "item count {} exceeds the maximum of {}",
                self.item_count,
                crate::constants::MAX_ITEM_COUNT
            )));
        }
        Ok(())
    }
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            item_count: crate::constants::DEFAULT_ITEM_COUNT,
            payload_size_target: crate::constants::DEFAULT_PAYLOAD_SIZE,
        }
    }
}

/// The closed set of execution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// One logical worker, items processed in task-source order.
    Sequential,
    /// One thread per item inside this process.
    ConcurrentSharedMemory,
    /// One child process per item, results sent back over pipes.
    ConcurrentIsolatedProcess,
}

impl StrategyKind {
    /// Every strategy, in reporting order.
    pub const ALL: [Self; 3] = [
        Self::Sequential,
        Self::ConcurrentSharedMemory,
        Self::ConcurrentIsolatedProcess,
    ];

    /// Canonical name used in logs and reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sequential => "Sequential",
            Self::ConcurrentSharedMemory => "ConcurrentSharedMemory",
            Self::ConcurrentIsolatedProcess => "ConcurrentIsolatedProcess",
        }
    }

    /// Short lowercase label used for file names.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::ConcurrentSharedMemory => "threads",
            Self::ConcurrentIsolatedProcess => "processes",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "baseline" => Ok(Self::Sequential),
            "concurrentsharedmemory" | "threads" | "multithreading" | "shared" => {
                Ok(Self::ConcurrentSharedMemory)
            }
            "concurrentisolatedprocess" | "processes" | "forking" | "isolated" => {
                Ok(Self::ConcurrentIsolatedProcess)
            }
            other => Err(StrategyError::Config(format!("unknown strategy: {other}"))),
        }
    }
}

/// Outcome of one completed (strategy, trial) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub strategy: StrategyKind,
    pub elapsed_seconds: f64,
    pub result_count: usize,
    pub error_count: usize,
}

impl TrialResult {
    /// Summarise a drained result collection.
    #[must_use]
    pub fn from_results(strategy: StrategyKind, elapsed_seconds: f64, results: &[FetchResult]) -> Self {
        Self {
            strategy,
            elapsed_seconds,
            result_count: results.len(),
            error_count: results.iter().filter(|r| r.is_err()).count(),
        }
    }
}

/// Mean/standard-deviation summary over the successful trials of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub strategy: StrategyKind,
    pub mean_seconds: f64,
    pub stddev_seconds: f64,
    /// Number of trials included in the sample.
    pub sample_count: usize,
    /// Trials excluded because the strategy itself failed.
    pub failed_trials: usize,
    pub workload: WorkloadParams,
}
