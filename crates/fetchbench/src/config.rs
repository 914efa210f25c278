//! Application configuration from CLI flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use fetchbench_core::constants::{DEFAULT_ITEM_COUNT, DEFAULT_PAYLOAD_SIZE, DEFAULT_TRIAL_COUNT};
use fetchbench_sources::{HttpConfig, SourceKind, SourceSettings};

use crate::errors::AppError;

/// FetchBench: compare sequential, threaded, and multi-process fetching.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fetchbench",
    version,
    about = "FetchBench: compare sequential, threaded, and multi-process fetching"
)]
pub struct AppConfig {
    /// Strategy to run: sequential, threads, processes, or all.
    #[arg(long, default_value = "all", env = "FETCHBENCH_STRATEGY")]
    pub strategy: String,

    /// Content source: wikipedia, reddit, or synthetic.
    #[arg(long, default_value = "wikipedia", env = "FETCHBENCH_SOURCE")]
    pub source: String,

    /// Number of items fetched per trial.
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITEM_COUNT)]
    pub items: usize,

    /// Payload size target (characters, posts, or bytes depending on the source).
    #[arg(long, default_value_t = DEFAULT_PAYLOAD_SIZE)]
    pub payload_size: usize,

    /// Trials per strategy.
    #[arg(short, long, default_value_t = DEFAULT_TRIAL_COUNT, env = "FETCHBENCH_TRIALS")]
    pub trials: usize,

    /// CSV file aggregate rows are appended to.
    #[arg(short, long, default_value = "results.csv")]
    pub output: PathBuf,

    /// Directory for per-key record files.
    #[arg(long)]
    pub records_dir: Option<PathBuf>,

    /// Per-item delay of the synthetic source, in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// Key the synthetic source fails on (repeatable).
    #[arg(long = "fail-key")]
    pub fail_keys: Vec<String>,

    /// Key the synthetic source panics on (repeatable).
    #[arg(long = "panic-key")]
    pub panic_keys: Vec<String>,

    /// HTTP request timeout (e.g. "30s", "500ms").
    #[arg(long, default_value = "30s")]
    pub http_timeout: String,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (one CSV-like line per strategy).
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,

    /// Run as a worker process for one key.
    #[arg(long = "worker-key", hide = true, allow_hyphen_values = true)]
    pub worker_key: Option<String>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse the HTTP timeout.
    pub fn http_timeout_duration(&self) -> Result<Duration, AppError> {
        parse_duration(&self.http_timeout)
            .ok_or_else(|| AppError::Config(format!("invalid duration: {}", self.http_timeout)))
    }

    /// Source settings shared by the parent and its workers.
    pub fn source_settings(&self) -> Result<SourceSettings, AppError> {
        let kind: SourceKind = self
            .source
            .parse()
            .map_err(|e: fetchbench_sources::SourceError| AppError::Config(e.to_string()))?;
        let mut settings = SourceSettings::new(kind, self.payload_size);
        settings.http = HttpConfig {
            timeout: self.http_timeout_duration()?,
            ..HttpConfig::default()
        };
        settings.delay = Duration::from_millis(self.delay_ms);
        settings.fail_keys.clone_from(&self.fail_keys);
        settings.panic_keys.clone_from(&self.panic_keys);
        Ok(settings)
    }

    /// Arguments a worker process needs to rebuild the same fetcher.
    ///
    /// The worker key itself is appended by the strategy.
    #[must_use]
    pub fn worker_args(&self) -> Vec<String> {
        let mut args = vec![
            "--source".to_string(),
            self.source.clone(),
            "--payload-size".to_string(),
            self.payload_size.to_string(),
            "--http-timeout".to_string(),
            self.http_timeout.clone(),
            "--delay-ms".to_string(),
            self.delay_ms.to_string(),
        ];
        for key in &self.fail_keys {
            args.push("--fail-key".to_string());
            args.push(key.clone());
        }
        for key in &self.panic_keys {
            args.push("--panic-key".to_string());
            args.push(key.clone());
        }
        if let Some(dir) = &self.records_dir {
            args.push("--records-dir".to_string());
            args.push(dir.display().to_string());
        }
        args
    }
}

/// Parse a duration string like "500ms", "30s", "2m", or a bare number of seconds.
pub(crate) fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse().ok().map(Duration::from_secs)
    }
}
