//! Application errors and exit codes.

use fetchbench_core::constants::exit_codes;
use fetchbench_core::error::{StrategyError, TrialError};
use fetchbench_orchestration::interfaces::ReportError;
use fetchbench_sources::SourceError;

/// Errors surfaced by the binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{failed} of {selected} strategies produced no successful trial; last error: {last}")]
    AllTrialsFailed {
        failed: usize,
        selected: usize,
        last: String,
    },

    #[error("cannot write report: {0}")]
    Report(#[from] ReportError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("worker output failed: {0}")]
    Worker(String),
}

impl AppError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_)
            | Self::Source(SourceError::Unknown(_))
            | Self::Strategy(StrategyError::Config(_)) => exit_codes::ERROR_CONFIG,
            Self::AllTrialsFailed { .. } => exit_codes::ERROR_ALL_TRIALS_FAILED,
            Self::Report(_) => exit_codes::ERROR_REPORT,
            Self::Source(_) | Self::Strategy(_) | Self::Worker(_) => exit_codes::ERROR_GENERIC,
        }
    }
}

impl From<TrialError> for AppError {
    fn from(err: TrialError) -> Self {
        match err {
            TrialError::InvalidTrialCount => Self::Config(err.to_string()),
            TrialError::Strategy(e) => Self::Strategy(e),
            TrialError::NoSuccessfulTrials { .. } => Self::AllTrialsFailed {
                failed: 1,
                selected: 1,
                last: err.to_string(),
            },
        }
    }
}

/// Map any error reaching `main` to an exit code.
#[must_use]
pub fn handle_error(err: &anyhow::Error) -> i32 {
    if let Some(app) = err.downcast_ref::<AppError>() {
        return app.exit_code();
    }
    if err.downcast_ref::<ReportError>().is_some() {
        return exit_codes::ERROR_REPORT;
    }
    exit_codes::ERROR_GENERIC
}
