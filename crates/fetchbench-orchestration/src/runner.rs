//! Trial runner and aggregation.
//!
//! `run_once` times a single strategy run; `run_trials` repeats it and
//! reduces the elapsed-time sample to an `AggregateStats`. Trials that fail
//! at the strategy level are logged and left out of the sample.

use std::time::Instant;

use tracing::{debug, warn};

use fetchbench_core::error::{StrategyError, TrialError};
use fetchbench_core::fetcher::{collect_work_items, TaskSource};
use fetchbench_core::observer::RunObserver;
use fetchbench_core::stats;
use fetchbench_core::types::{
    AggregateStats, FetchResult, StrategyKind, TrialResult, WorkloadParams,
};

use crate::strategy::ExecutionStrategy;

/// One completed run: its timing summary and every drained result.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub trial: TrialResult,
    pub results: Vec<FetchResult>,
}

/// Run `strategy` once over the keys `source` yields for `params`.
///
/// The clock starts once the keys are known and stops after every worker
/// has been joined and every result drained.
pub fn run_once(
    strategy: &dyn ExecutionStrategy,
    source: &dyn TaskSource,
    params: &WorkloadParams,
    observer: &dyn RunObserver,
) -> Result<RunReport, StrategyError> {
    params.validate()?;
    let items = collect_work_items(source, params.item_count)?;
    debug!(strategy = strategy.name(), items = items.len(), "Starting run");

    let start = Instant::now();
    let results = strategy.execute(&items, observer)?;
    let elapsed = start.elapsed().as_secs_f64();

    if results.len() != items.len() {
        return Err(StrategyError::Collector(format!(
            "{} results for {} items",
            results.len(),
            items.len()
        )));
    }

    Ok(RunReport {
        trial: TrialResult::from_results(strategy.kind(), elapsed, &results),
        results,
    })
}

/// Run `strategy` `trial_count` times and aggregate the elapsed times.
pub fn run_trials(
    strategy: &dyn ExecutionStrategy,
    source: &dyn TaskSource,
    params: &WorkloadParams,
    trial_count: usize,
    observer: &dyn RunObserver,
) -> Result<AggregateStats, TrialError> {
    if trial_count == 0 {
        return Err(TrialError::InvalidTrialCount);
    }

    let kind = strategy.kind();
    let mut samples = Vec::with_capacity(trial_count);
    let mut last_error = None;

    for trial in 0..trial_count {
        match run_once(strategy, source, params, observer) {
            Ok(report) => {
                let t = &report.trial;
                debug!(
                    strategy = %kind,
                    trial,
                    elapsed_secs = t.elapsed_seconds,
                    errors = t.error_count,
                    "Trial complete"
                );
                observer.on_trial_end(kind, trial, Some(t.elapsed_seconds));
                samples.push(t.elapsed_seconds);
            }
            Err(e) => {
                warn!(strategy = %kind, trial, error = %e, "Trial failed, excluded from aggregate");
                observer.on_trial_end(kind, trial, None);
                last_error = Some(e);
            }
        }
    }

    let Some(summary) = stats::summarize(&samples) else {
        return Err(TrialError::NoSuccessfulTrials {
            strategy: kind.name().to_string(),
            attempted: trial_count,
            last: last_error
                .unwrap_or_else(|| StrategyError::Worker("no trial produced a sample".into())),
        });
    };

    Ok(AggregateStats {
        strategy: kind,
        mean_seconds: summary.mean,
        stddev_seconds: summary.stddev,
        sample_count: summary.count,
        failed_trials: trial_count - summary.count,
        workload: *params,
    })
}

/// Speedup of one strategy relative to the sequential baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub strategy: StrategyKind,
    pub mean_seconds: f64,
    /// Baseline mean divided by this mean; `None` without a baseline.
    pub speedup: Option<f64>,
}

/// Compare aggregates against the `Sequential` one, if present.
#[must_use]
pub fn analyze_comparison(aggregates: &[AggregateStats]) -> Vec<Comparison> {
    let baseline = aggregates
        .iter()
        .find(|a| a.strategy == StrategyKind::Sequential)
        .map(|a| a.mean_seconds);

    aggregates
        .iter()
        .map(|a| Comparison {
            strategy: a.strategy,
            mean_seconds: a.mean_seconds,
            speedup: baseline
                .filter(|_| a.mean_seconds > 0.0)
                .map(|base| base / a.mean_seconds),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use fetchbench_core::error::FetchError;
    use fetchbench_core::observer::NoOpObserver;
    use fetchbench_core::types::WorkItem;

    struct Keys(Vec<&'static str>);

    impl TaskSource for Keys {
        fn list_keys(&self, limit: usize) -> Result<Vec<String>, FetchError> {
            Ok(self.0.iter().take(limit).map(ToString::to_string).collect())
        }

        fn name(&self) -> &str {
            "keys"
        }
    }

    struct DownSource;

    impl TaskSource for DownSource {
        fn list_keys(&self, _limit: usize) -> Result<Vec<String>, FetchError> {
            Err(FetchError::Http("connection refused".into()))
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    /// Sleeps a fixed time per run; fails the runs listed in `fail_on`.
    struct FixedStrategy {
        delay: Duration,
        calls: AtomicUsize,
        fail_on: Vec<usize>,
    }

    impl FixedStrategy {
        fn new(delay_ms: u64, fail_on: Vec<usize>) -> Self {
            Self {
                delay: Duration::from_millis(delay_ms),
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    impl ExecutionStrategy for FixedStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::Sequential
        }

        fn execute(
            &self,
            items: &[WorkItem],
            _observer: &dyn RunObserver,
        ) -> Result<Vec<FetchResult>, StrategyError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&call) {
                return Err(StrategyError::Worker("simulated".into()));
            }
            std::thread::sleep(self.delay);
            Ok(items
                .iter()
                .map(|i| FetchResult::Ok {
                    key: i.key().to_string(),
                    payload: String::new(),
                })
                .collect())
        }
    }

    fn params(n: usize) -> WorkloadParams {
        WorkloadParams::new(n, 10)
    }

    #[test]
    fn run_once_counts_results() {
        let strategy = FixedStrategy::new(0, vec![]);
        let report = run_once(&strategy, &Keys(vec!["a", "b", "c"]), &params(2), &NoOpObserver::new())
            .unwrap();
        assert_eq!(report.trial.result_count, 2);
        assert_eq!(report.trial.error_count, 0);
        assert_eq!(report.results.len(), 2);
    }

    #[test]
    fn task_source_failure_aborts_run() {
        let strategy = FixedStrategy::new(0, vec![]);
        let err = run_once(&strategy, &DownSource, &params(2), &NoOpObserver::new()).unwrap_err();
        assert!(matches!(err, StrategyError::TaskSource(msg) if msg.starts_with("down")));
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_params_abort_run() {
        let strategy = FixedStrategy::new(0, vec![]);
        let bad = WorkloadParams::new(1, 0);
        assert!(matches!(
            run_once(&strategy, &Keys(vec!["a"]), &bad, &NoOpObserver::new()),
            Err(StrategyError::Config(_))
        ));
    }

    #[test]
    fn aggregate_of_fixed_delay() {
        let strategy = FixedStrategy::new(50, vec![]);
        let agg = run_trials(&strategy, &Keys(vec!["a"]), &params(1), 5, &NoOpObserver::new())
            .unwrap();
        assert_eq!(agg.sample_count, 5);
        assert_eq!(agg.failed_trials, 0);
        assert!((agg.mean_seconds - 0.05).abs() < 0.03, "mean {}", agg.mean_seconds);
        assert!(agg.stddev_seconds < 0.02, "stddev {}", agg.stddev_seconds);
    }

    #[test]
    fn failed_trials_are_excluded() {
        let strategy = FixedStrategy::new(0, vec![1, 3]);
        let agg = run_trials(&strategy, &Keys(vec!["a"]), &params(1), 5, &NoOpObserver::new())
            .unwrap();
        assert_eq!(agg.sample_count, 3);
        assert_eq!(agg.failed_trials, 2);
    }

    #[test]
    fn all_trials_failing_is_an_error() {
        let strategy = FixedStrategy::new(0, vec![0, 1]);
        let err = run_trials(&strategy, &Keys(vec!["a"]), &params(1), 2, &NoOpObserver::new())
            .unwrap_err();
        assert!(matches!(err, TrialError::NoSuccessfulTrials { attempted: 2, .. }));
    }

    #[test]
    fn zero_trials_rejected() {
        let strategy = FixedStrategy::new(0, vec![]);
        assert!(matches!(
            run_trials(&strategy, &Keys(vec![]), &params(0), 0, &NoOpObserver::new()),
            Err(TrialError::InvalidTrialCount)
        ));
    }

    fn agg(strategy: StrategyKind, mean: f64) -> AggregateStats {
        AggregateStats {
            strategy,
            mean_seconds: mean,
            stddev_seconds: 0.0,
            sample_count: 1,
            failed_trials: 0,
            workload: params(1),
        }
    }

    #[test]
    fn comparison_against_sequential() {
        let cmp = analyze_comparison(&[
            agg(StrategyKind::Sequential, 0.9),
            agg(StrategyKind::ConcurrentSharedMemory, 0.3),
        ]);
        assert!((cmp[0].speedup.unwrap() - 1.0).abs() < 1e-12);
        assert!((cmp[1].speedup.unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn comparison_without_baseline() {
        let cmp = analyze_comparison(&[agg(StrategyKind::ConcurrentIsolatedProcess, 0.5)]);
        assert!(cmp[0].speedup.is_none());
    }
}
