//! Offline source and fetcher with a fixed per-item delay.
//!
//! Used for benchmarking without network access and for tests that need
//! deterministic timing or injected failures.

use std::collections::HashSet;
use std::time::Duration;

use fetchbench_core::error::FetchError;
use fetchbench_core::fetcher::{Fetcher, TaskSource};

/// Keys `item-0`, `item-1`, ...
pub struct SyntheticSource;

impl TaskSource for SyntheticSource {
    fn list_keys(&self, limit: usize) -> Result<Vec<String>, FetchError> {
        Ok((0..limit).map(|i| format!("item-{i}")).collect())
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Sleeps `delay`, then returns `payload_size` bytes derived from the key.
#[derive(Debug, Clone, Default)]
pub struct SyntheticFetcher {
    delay: Duration,
    payload_size: usize,
    fail_keys: HashSet<String>,
    panic_keys: HashSet<String>,
}

impl SyntheticFetcher {
    #[must_use]
    pub fn new(delay: Duration, payload_size: usize) -> Self {
        Self {
            delay,
            payload_size,
            ..Self::default()
        }
    }

    /// Fail with an error for these keys.
    #[must_use]
    pub fn failing<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fail_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Panic for these keys.
    #[must_use]
    pub fn panicking<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.panic_keys.extend(keys.into_iter().map(Into::into));
        self
    }
}

impl Fetcher for SyntheticFetcher {
    fn fetch(&self, key: &str) -> Result<String, FetchError> {
        std::thread::sleep(self.delay);
        if self.panic_keys.contains(key) {
            panic!("synthetic panic for {key}");
        }
        if self.fail_keys.contains(key) {
            return Err(FetchError::Other(format!("synthetic failure for {key}")));
        }
        Ok(key
            .chars()
            .filter(char::is_ascii)
            .chain(std::iter::repeat('.'))
            .take(self.payload_size)
            .collect())
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
