//! CLI result presenter.

use fetchbench_core::types::AggregateStats;
use fetchbench_orchestration::interfaces::ResultPresenter;
use fetchbench_orchestration::runner::Comparison;

use crate::output::{format_mean_stddev, format_seconds, format_speedup};
use crate::ui;

/// Prints aggregates and comparisons to stdout.
pub struct CliPresenter {
    verbose: bool,
    quiet: bool,
}

impl CliPresenter {
    #[must_use]
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }
}

/// One comparison line, without styling.
#[must_use]
pub fn comparison_row(c: &Comparison) -> String {
    format!(
        "  {:<28} {:>12} {:>9}",
        c.strategy.name(),
        format_seconds(c.mean_seconds),
        format_speedup(c.speedup)
    )
}

impl ResultPresenter for CliPresenter {
    fn present_aggregate(&self, stats: &AggregateStats) {
        if self.quiet {
            println!(
                "{},{:.6},{:.6}",
                stats.strategy.name(),
                stats.mean_seconds,
                stats.stddev_seconds
            );
            return;
        }

        ui::print_success(&format!(
            "{}: {} over {} trials",
            stats.strategy,
            format_mean_stddev(stats.mean_seconds, stats.stddev_seconds),
            stats.sample_count
        ));
        if stats.failed_trials > 0 {
            ui::print_warning(&format!(
                "{} trials of {} failed and were excluded",
                stats.failed_trials, stats.strategy
            ));
        }
        if self.verbose {
            println!(
                "  items per trial: {}, payload size target: {}",
                stats.workload.item_count, stats.workload.payload_size_target
            );
        }
    }

    fn present_comparison(&self, comparisons: &[Comparison]) {
        if self.quiet || comparisons.len() < 2 {
            return;
        }

        println!();
        ui::print_header("Comparison");
        println!("  {:<28} {:>12} {:>9}", "Strategy", "Mean", "Speedup");
        println!("  {:-<51}", "");
        for c in comparisons {
            println!("{}", comparison_row(c));
        }
    }

    fn present_error(&self, error: &str) {
        ui::print_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchbench_core::types::{StrategyKind, WorkloadParams};

    fn stats(failed: usize) -> AggregateStats {
        AggregateStats {
            strategy: StrategyKind::ConcurrentSharedMemory,
            mean_seconds: 0.25,
            stddev_seconds: 0.01,
            sample_count: 5,
            failed_trials: failed,
            workload: WorkloadParams::default(),
        }
    }

    #[test]
    fn comparison_row_layout() {
        let row = comparison_row(&Comparison {
            strategy: StrategyKind::ConcurrentSharedMemory,
            mean_seconds: 0.25,
            speedup: Some(4.0),
        });
        assert!(row.contains("ConcurrentSharedMemory"));
        assert!(row.contains("250.0ms"));
        assert!(row.trim_end().ends_with("4.00x"));
    }

    #[test]
    fn presenting_does_not_panic() {
        for (verbose, quiet) in [(false, false), (true, false), (false, true)] {
            let p = CliPresenter::new(verbose, quiet);
            p.present_aggregate(&stats(0));
            p.present_aggregate(&stats(2));
            p.present_comparison(&[]);
            p.present_comparison(&[
                Comparison {
                    strategy: StrategyKind::Sequential,
                    mean_seconds: 1.0,
                    speedup: Some(1.0),
                },
                Comparison {
                    strategy: StrategyKind::ConcurrentIsolatedProcess,
                    mean_seconds: 0.5,
                    speedup: Some(2.0),
                },
            ]);
            p.present_error("boom");
        }
    }
}
