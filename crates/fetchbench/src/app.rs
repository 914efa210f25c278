//! Application entry point and dispatch.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use fetchbench_cli::presenter::CliPresenter;
use fetchbench_cli::progress::ProgressObserver;
use fetchbench_cli::report::{CsvRecordSink, CsvReporter};
use fetchbench_cli::ui;
use fetchbench_core::fetcher::RecordSink;
use fetchbench_core::observer::{LoggingObserver, ObserverSet, RunObserver};
use fetchbench_core::task::FetchTask;
use fetchbench_core::types::{AggregateStats, StrategyKind, WorkloadParams};
use fetchbench_orchestration::harness::Harness;
use fetchbench_orchestration::interfaces::{Reporter, ResultPresenter};
use fetchbench_orchestration::process::{self, WorkerCommand};
use fetchbench_orchestration::registry::{select_strategies, DefaultStrategyFactory};
use fetchbench_orchestration::runner::analyze_comparison;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        fetchbench_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }

    if let Some(key) = &config.worker_key {
        return run_worker(config, key);
    }

    run_benchmark(config)
}

/// Worker mode: fetch one key and write its framed result to stdout.
fn run_worker(config: &AppConfig, key: &str) -> Result<()> {
    let bundle = fetchbench_sources::build(&config.source_settings()?).map_err(AppError::from)?;
    let mut task = FetchTask::new(bundle.fetcher);
    if let Some(dir) = &config.records_dir {
        task = task.with_records(Arc::new(CsvRecordSink::new(
            dir,
            StrategyKind::ConcurrentIsolatedProcess,
        )));
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    process::run_worker(&task, key, &mut out).map_err(|e| AppError::Worker(e.to_string()))?;
    out.flush().map_err(|e| AppError::Worker(e.to_string()))?;
    Ok(())
}

/// Observers notified during the benchmark: the progress bar, plus event
/// logging in verbose mode.
fn run_observers(config: &AppConfig, progress: Arc<ProgressObserver>) -> ObserverSet {
    let observers = ObserverSet::new().with(progress as Arc<dyn RunObserver>);
    if config.verbose {
        observers.with(Arc::new(LoggingObserver))
    } else {
        observers
    }
}

fn run_benchmark(config: &AppConfig) -> Result<()> {
    if config.trials == 0 {
        return Err(AppError::Config("trial count must be at least 1".into()).into());
    }
    let params = WorkloadParams::new(config.items, config.payload_size);
    params.validate().map_err(AppError::from)?;

    let bundle = fetchbench_sources::build(&config.source_settings()?).map_err(AppError::from)?;
    let worker = WorkerCommand::current_exe(config.worker_args()).map_err(AppError::from)?;
    let mut factory = DefaultStrategyFactory::new(FetchTask::new(bundle.fetcher)).with_worker(worker);
    if let Some(dir) = config.records_dir.clone() {
        factory = factory.with_records(move |kind| {
            Arc::new(CsvRecordSink::new(dir.clone(), kind)) as Arc<dyn RecordSink>
        });
    }

    let kinds: Vec<StrategyKind> = select_strategies(&config.strategy, &factory)
        .map_err(AppError::from)?
        .iter()
        .map(|s| s.kind())
        .collect();

    let progress = Arc::new(if config.quiet {
        ProgressObserver::hidden()
    } else {
        ProgressObserver::new()
    });
    let harness = Harness::new(Arc::new(factory), bundle.source)
        .with_observer(Arc::new(run_observers(config, progress.clone())));
    let presenter = CliPresenter::new(config.verbose, config.quiet);
    let reporter = CsvReporter::new(&config.output);

    info!(
        strategies = kinds.len(),
        items = params.item_count,
        trials = config.trials,
        source = %config.source,
        "Starting benchmark"
    );

    let mut aggregates: Vec<AggregateStats> = Vec::with_capacity(kinds.len());
    let mut failures = Vec::new();
    for kind in &kinds {
        if !config.quiet {
            ui::print_header(kind.name());
        }
        progress.begin(*kind, config.trials, params.item_count);
        let outcome = harness.run_trials(*kind, &params, config.trials);
        progress.finish();

        match outcome {
            Ok(stats) => {
                info!(
                    strategy = %kind,
                    mean_secs = stats.mean_seconds,
                    stddev_secs = stats.stddev_seconds,
                    "Aggregate complete"
                );
                presenter.present_aggregate(&stats);
                reporter.append_row(&stats).map_err(AppError::from)?;
                aggregates.push(stats);
            }
            Err(e) => {
                warn!(strategy = %kind, error = %e, "Strategy produced no aggregate");
                presenter.present_error(&format!("{kind}: {e}"));
                failures.push(AppError::from(e));
            }
        }
    }

    presenter.present_comparison(&analyze_comparison(&aggregates));

    match failures.len() {
        0 => Ok(()),
        1 if !matches!(failures[0], AppError::AllTrialsFailed { .. }) => {
            Err(failures.remove(0).into())
        }
        failed => Err(AppError::AllTrialsFailed {
            failed,
            selected: kinds.len(),
            last: match failures.last() {
                Some(AppError::AllTrialsFailed { last, .. }) => last.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> AppConfig {
        let mut argv = vec!["fetchbench"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn verbose_adds_logging_observer() {
        let progress = Arc::new(ProgressObserver::hidden());
        assert_eq!(run_observers(&config(&[]), progress.clone()).len(), 1);
        assert_eq!(run_observers(&config(&["-v"]), progress).len(), 2);
    }
}
