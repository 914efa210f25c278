//! Workload defaults and exit codes.

/// Default number of work items per trial.
pub const DEFAULT_ITEM_COUNT: usize = 5;

/// Default payload-size target handed to fetchers.
pub const DEFAULT_PAYLOAD_SIZE: usize = 1200;

/// Default number of trials per strategy.
pub const DEFAULT_TRIAL_COUNT: usize = 30;

/// Upper bound on the fan-out of the concurrent strategies.
///
/// Both concurrent strategies start one worker per item, so the item count
/// is capped to keep thread and process creation within OS limits.
pub const MAX_ITEM_COUNT: usize = 256;

/// Message stored in a result when a worker process exits without reporting.
pub const WORKER_NO_RESULT: &str = "worker exited without a result";

/// Exit codes for the `fetchbench` binary.
pub mod exit_codes {
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// Every trial of at least one strategy failed.
    pub const ERROR_ALL_TRIALS_FAILED: i32 = 3;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
    /// The aggregate report could not be written.
    pub const ERROR_REPORT: i32 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_bounds() {
        assert!(DEFAULT_ITEM_COUNT <= MAX_ITEM_COUNT);
        assert!(DEFAULT_PAYLOAD_SIZE > 0);
        assert!(DEFAULT_TRIAL_COUNT > 0);
    }
}
