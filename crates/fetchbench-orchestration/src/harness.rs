//! Invocation surface exposed to front ends.

use std::sync::Arc;

use fetchbench_core::error::{StrategyError, TrialError};
use fetchbench_core::fetcher::TaskSource;
use fetchbench_core::observer::{NoOpObserver, RunObserver};
use fetchbench_core::types::{AggregateStats, StrategyKind, TrialResult, WorkloadParams};

use crate::registry::StrategyFactory;
use crate::runner::{self, RunReport};

/// Runs named strategies against one task source.
///
/// Both entry points block until every worker has finished.
pub struct Harness {
    factory: Arc<dyn StrategyFactory>,
    source: Arc<dyn TaskSource>,
    observer: Arc<dyn RunObserver>,
}

impl Harness {
    #[must_use]
    pub fn new(factory: Arc<dyn StrategyFactory>, source: Arc<dyn TaskSource>) -> Self {
        Self {
            factory,
            source,
            observer: Arc::new(NoOpObserver::new()),
        }
    }

    /// Replace the observer notified during runs.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Strategies this harness can run.
    #[must_use]
    pub fn strategies(&self) -> Vec<StrategyKind> {
        self.factory.available()
    }

    /// Run one strategy once.
    pub fn run(&self, kind: StrategyKind, params: &WorkloadParams) -> Result<TrialResult, StrategyError> {
        self.run_detailed(kind, params).map(|report| report.trial)
    }

    /// Run one strategy once and keep every result.
    pub fn run_detailed(
        &self,
        kind: StrategyKind,
        params: &WorkloadParams,
    ) -> Result<RunReport, StrategyError> {
        let strategy = self.factory.get(kind)?;
        runner::run_once(strategy.as_ref(), self.source.as_ref(), params, self.observer.as_ref())
    }

    /// Run one strategy `trial_count` times and aggregate.
    pub fn run_trials(
        &self,
        kind: StrategyKind,
        params: &WorkloadParams,
        trial_count: usize,
    ) -> Result<AggregateStats, TrialError> {
        let strategy = self.factory.get(kind)?;
        runner::run_trials(
            strategy.as_ref(),
            self.source.as_ref(),
            params,
            trial_count,
            self.observer.as_ref(),
        )
    }
}
