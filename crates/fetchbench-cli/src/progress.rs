//! Progress bar driven by run events.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use fetchbench_core::observer::{Phase, RunObserver};
use fetchbench_core::types::{FetchResult, StrategyKind};

/// Run observer that advances one bar per completed item.
///
/// One bar is reused for every strategy; call [`ProgressObserver::begin`]
/// before each batch of trials.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    /// Visible progress bar on stderr.
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Progress observer that draws nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Reset the bar for `trials` runs of `items` items each.
    pub fn begin(&self, strategy: StrategyKind, trials: usize, items: usize) {
        self.bar.reset();
        self.bar.set_length((trials * items) as u64);
        self.bar.set_message(format!("{strategy}: starting"));
    }

    /// Clear the bar once a strategy is finished.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Items counted so far for the current strategy.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for ProgressObserver {
    fn on_phase(&self, strategy: StrategyKind, phase: Phase) {
        self.bar.set_message(format!("{strategy}: {phase}"));
    }

    fn on_item(&self, _strategy: StrategyKind, _result: &FetchResult) {
        self.bar.inc(1);
    }

    fn on_trial_end(&self, strategy: StrategyKind, trial: usize, elapsed: Option<f64>) {
        let msg = match elapsed {
            Some(_) => format!("{strategy}: trial {} done", trial + 1),
            None => format!("{strategy}: trial {} failed", trial + 1),
        };
        self.bar.set_message(msg);
    }
}
