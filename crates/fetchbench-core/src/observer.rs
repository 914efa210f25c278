//! Run observers and the run-phase state machine.
//!
//! Every strategy walks `Idle -> Dispatching -> Draining -> Done` through a
//! `PhaseTracker`, which notifies observers and refuses to reach `Done`
//! until every worker has been joined and every result drained.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::StrategyError;
use crate::types::{FetchResult, StrategyKind};

/// Phase of a single strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dispatching,
    Draining,
    Done,
}

impl Phase {
    fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Dispatching),
            Self::Dispatching => Some(Self::Draining),
            Self::Draining => Some(Self::Done),
            Self::Done => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Dispatching => "dispatching",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Observer trait for run progress.
pub trait RunObserver: Send + Sync {
    /// A run entered a new phase.
    fn on_phase(&self, strategy: StrategyKind, phase: Phase);

    /// A result was produced for one item.
    fn on_item(&self, strategy: StrategyKind, result: &FetchResult);

    /// A trial ended. `elapsed` is `None` when the trial failed.
    fn on_trial_end(&self, _strategy: StrategyKind, _trial: usize, _elapsed: Option<f64>) {}
}

/// Null object pattern: ignores every event.
pub struct NoOpObserver;

impl NoOpObserver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for NoOpObserver {
    fn on_phase(&self, _strategy: StrategyKind, _phase: Phase) {}
    fn on_item(&self, _strategy: StrategyKind, _result: &FetchResult) {}
}

/// Observer that forwards events to `tracing`.
pub struct LoggingObserver;

impl RunObserver for LoggingObserver {
    fn on_phase(&self, strategy: StrategyKind, phase: Phase) {
        if phase == Phase::Done {
            info!(strategy = %strategy, "Run complete");
        } else {
            debug!(strategy = %strategy, phase = %phase, "Phase change");
        }
    }

    fn on_item(&self, strategy: StrategyKind, result: &FetchResult) {
        debug!(strategy = %strategy, key = result.key(), ok = result.is_ok(), "Item finished");
    }

    fn on_trial_end(&self, strategy: StrategyKind, trial: usize, elapsed: Option<f64>) {
        match elapsed {
            Some(secs) => info!(strategy = %strategy, trial, elapsed_secs = secs, "Trial finished"),
            None => warn!(strategy = %strategy, trial, "Trial aborted"),
        }
    }
}

/// Fans every event out to a fixed list of observers, in order.
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn RunObserver>>,
}

impl ObserverSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    #[must_use]
    pub fn with(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RunObserver for ObserverSet {
    fn on_phase(&self, strategy: StrategyKind, phase: Phase) {
        for observer in &self.observers {
            observer.on_phase(strategy, phase);
        }
    }

    fn on_item(&self, strategy: StrategyKind, result: &FetchResult) {
        for observer in &self.observers {
            observer.on_item(strategy, result);
        }
    }

    fn on_trial_end(&self, strategy: StrategyKind, trial: usize, elapsed: Option<f64>) {
        for observer in &self.observers {
            observer.on_trial_end(strategy, trial, elapsed);
        }
    }
}

/// Enforces the phase order of one run.
pub struct PhaseTracker<'a> {
    strategy: StrategyKind,
    phase: Phase,
    observer: &'a dyn RunObserver,
}

impl<'a> PhaseTracker<'a> {
    /// Start tracking a run in the `Idle` phase.
    #[must_use]
    pub fn new(strategy: StrategyKind, observer: &'a dyn RunObserver) -> Self {
        Self {
            strategy,
            phase: Phase::Idle,
            observer,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `Dispatching`.
    pub fn dispatch(&mut self) -> Result<(), StrategyError> {
        self.advance(Phase::Dispatching)
    }

    /// Move to `Draining`.
    pub fn drain(&mut self) -> Result<(), StrategyError> {
        self.advance(Phase::Draining)
    }

    /// Move to `Done`, gated on worker joins and the collector flush.
    ///
    /// `joined` is the number of workers confirmed finished and `drained`
    /// the number of results flushed out of the collector; both must equal
    /// `expected`.
    pub fn finish(
        &mut self,
        joined: usize,
        drained: usize,
        expected: usize,
    ) -> Result<(), StrategyError> {
        if joined != expected {
            return Err(StrategyError::Worker(format!(
                "{joined} of {expected} workers confirmed finished"
            )));
        }
        if drained != expected {
            return Err(StrategyError::Collector(format!(
                "drained {drained} results, expected {expected}"
            )));
        }
        self.advance(Phase::Done)
    }

    /// Forward an item result to the observer.
    pub fn item(&self, result: &FetchResult) {
        self.observer.on_item(self.strategy, result);
    }

    fn advance(&mut self, to: Phase) -> Result<(), StrategyError> {
        if self.phase.next() != Some(to) {
            return Err(StrategyError::Phase(format!("{} -> {to}", self.phase)));
        }
        self.phase = to;
        self.observer.on_phase(self.strategy, to);
        Ok(())
    }
}
