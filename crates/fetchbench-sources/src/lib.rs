//! # fetchbench-sources
//!
//! Task sources and fetchers the harness can benchmark against: Wikipedia
//! article introductions, Reddit top posts, and an offline synthetic
//! workload with a fixed per-item delay.

pub mod http;
pub mod reddit;
pub mod synthetic;
pub mod text;
pub mod wikipedia;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use fetchbench_core::error::FetchError;
use fetchbench_core::fetcher::{Fetcher, TaskSource};

pub use http::{HttpClient, HttpConfig};
pub use reddit::{RedditFetcher, RedditSource};
pub use synthetic::{SyntheticFetcher, SyntheticSource};
pub use wikipedia::{WikipediaFetcher, WikipediaSource};

/// Errors raised while choosing or building a source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("unknown source: {0} (expected wikipedia, reddit, or synthetic)")]
    Unknown(String),

    #[error("cannot build source: {0}")]
    Build(#[from] FetchError),
}

/// The available content sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Wikipedia,
    Reddit,
    Synthetic,
}

impl SourceKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Wikipedia => "wikipedia",
            Self::Reddit => "reddit",
            Self::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wikipedia" | "wiki" => Ok(Self::Wikipedia),
            "reddit" => Ok(Self::Reddit),
            "synthetic" => Ok(Self::Synthetic),
            other => Err(SourceError::Unknown(other.to_string())),
        }
    }
}

/// Settings needed to build a source and its fetcher.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub payload_size_target: usize,
    pub http: HttpConfig,
    /// Per-item delay of the synthetic fetcher.
    pub delay: Duration,
    /// Keys the synthetic fetcher fails on.
    pub fail_keys: Vec<String>,
    /// Keys the synthetic fetcher panics on.
    pub panic_keys: Vec<String>,
}

impl SourceSettings {
    #[must_use]
    pub fn new(kind: SourceKind, payload_size_target: usize) -> Self {
        Self {
            kind,
            payload_size_target,
            http: HttpConfig::default(),
            delay: Duration::ZERO,
            fail_keys: Vec::new(),
            panic_keys: Vec::new(),
        }
    }
}

/// A matched task source and fetcher.
pub struct SourceBundle {
    pub source: Arc<dyn TaskSource>,
    pub fetcher: Arc<dyn Fetcher>,
}

/// Build a fresh task source and fetcher.
///
/// Remote sources get their own HTTP client per call, so each worker process
/// builds its own connection pool.
pub fn build(settings: &SourceSettings) -> Result<SourceBundle, SourceError> {
    let bundle = match settings.kind {
        SourceKind::Wikipedia => {
            let client = HttpClient::new(&settings.http)?;
            SourceBundle {
                source: Arc::new(WikipediaSource::new(client.clone())),
                fetcher: Arc::new(WikipediaFetcher::new(client, settings.payload_size_target)),
            }
        }
        SourceKind::Reddit => {
            let client = HttpClient::new(&settings.http)?;
            SourceBundle {
                source: Arc::new(RedditSource),
                fetcher: Arc::new(RedditFetcher::new(client, settings.payload_size_target)),
            }
        }
        SourceKind::Synthetic => SourceBundle {
            source: Arc::new(SyntheticSource),
            fetcher: Arc::new(
                SyntheticFetcher::new(settings.delay, settings.payload_size_target)
                    .failing(settings.fail_keys.iter().cloned())
                    .panicking(settings.panic_keys.iter().cloned()),
            ),
        },
    };
    Ok(bundle)
}
