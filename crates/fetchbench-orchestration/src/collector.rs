//! Result collectors, one shape per strategy.
//!
//! All three share the `ResultCollector` contract: producers call `collect`,
//! the strategy calls `drain_all` once every producer is done. Each
//! implementation checks that exactly the expected number of results came
//! out.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use fetchbench_core::error::StrategyError;
use fetchbench_core::types::FetchResult;

/// Accumulates the results of one run.
pub trait ResultCollector {
    /// Record one result.
    fn collect(&mut self, result: FetchResult);

    /// Consume the collector and return every recorded result.
    fn drain_all(self) -> Result<Vec<FetchResult>, StrategyError>;
}

fn check_count(got: usize, expected: usize) -> Result<(), StrategyError> {
    if got == expected {
        Ok(())
    } else {
        Err(StrategyError::Collector(format!(
            "collected {got} results, expected {expected}"
        )))
    }
}

/// Plain ordered list for a single thread of control.
pub struct LocalCollector {
    results: Vec<FetchResult>,
    expected: usize,
}

impl LocalCollector {
    #[must_use]
    pub fn new(expected: usize) -> Self {
        Self {
            results: Vec::with_capacity(expected),
            expected,
        }
    }
}

impl ResultCollector for LocalCollector {
    fn collect(&mut self, result: FetchResult) {
        self.results.push(result);
    }

    fn drain_all(self) -> Result<Vec<FetchResult>, StrategyError> {
        check_count(self.results.len(), self.expected)?;
        Ok(self.results)
    }
}

/// Mutex-protected list shared by concurrent writers.
///
/// Each writer holds its own clone. `drain_all` only succeeds once every
/// other clone has been dropped, i.e. after all writers are joined.
#[derive(Clone)]
pub struct SharedCollector {
    inner: Arc<Mutex<Vec<FetchResult>>>,
    expected: usize,
}

impl SharedCollector {
    #[must_use]
    pub fn new(expected: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::with_capacity(expected))),
            expected,
        }
    }
}

impl ResultCollector for SharedCollector {
    fn collect(&mut self, result: FetchResult) {
        self.inner.lock().push(result);
    }

    fn drain_all(self) -> Result<Vec<FetchResult>, StrategyError> {
        let expected = self.expected;
        let results = Arc::try_unwrap(self.inner)
            .map_err(|arc| {
                StrategyError::Collector(format!(
                    "{} writers still hold the collector",
                    Arc::strong_count(&arc) - 1
                ))
            })?
            .into_inner();
        check_count(results.len(), expected)?;
        Ok(results)
    }
}

/// Producer end of a `ChannelCollector`.
///
/// Each producer delivers at most one result; it is consumed on send.
pub struct ResultProducer {
    tx: Sender<FetchResult>,
}

impl ResultProducer {
    /// Send this producer's single result. Returns `false` if the consumer
    /// has already gone away.
    pub fn deliver(self, result: FetchResult) -> bool {
        self.tx.send(result).is_ok()
    }
}

/// Point-to-point channel drained by a single consumer.
///
/// `drain_all` first closes the collector's own sender, then reads exactly
/// `expected` messages and rejects any surplus. Callers must only drain after
/// every producer has finished.
pub struct ChannelCollector {
    tx: Option<Sender<FetchResult>>,
    rx: Receiver<FetchResult>,
    expected: usize,
}

impl ChannelCollector {
    #[must_use]
    pub fn new(expected: usize) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx: Some(tx),
            rx,
            expected,
        }
    }

    /// Create a producer handle. Returns an error after draining has begun.
    pub fn producer(&self) -> Result<ResultProducer, StrategyError> {
        self.tx
            .as_ref()
            .map(|tx| ResultProducer { tx: tx.clone() })
            .ok_or_else(|| StrategyError::Channel("collector already closed".into()))
    }
}

impl ResultCollector for ChannelCollector {
    fn collect(&mut self, result: FetchResult) {
        if let Some(tx) = &self.tx {
            // The receiver lives in `self`, so the channel cannot be disconnected here.
            let _ = tx.send(result);
        }
    }

    fn drain_all(mut self) -> Result<Vec<FetchResult>, StrategyError> {
        drop(self.tx.take());

        let mut results = Vec::with_capacity(self.expected);
        while results.len() < self.expected {
            match self.rx.recv() {
                Ok(result) => results.push(result),
                Err(_) => {
                    return Err(StrategyError::Channel(format!(
                        "channel closed after {} of {} results",
                        results.len(),
                        self.expected
                    )));
                }
            }
        }

        match self.rx.try_recv() {
            Err(TryRecvError::Disconnected) => Ok(results),
            Ok(extra) => Err(StrategyError::Collector(format!(
                "unexpected extra result for key {}",
                extra.key()
            ))),
            Err(TryRecvError::Empty) => Err(StrategyError::Channel(
                "producers still connected after drain".into(),
            )),
        }
    }
}
