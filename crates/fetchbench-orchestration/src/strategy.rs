//! Execution strategies running inside this process.
//!
//! `SequentialStrategy` processes items one after another on the calling
//! thread. `SharedMemoryStrategy` starts one thread per item, all sharing the
//! same fetcher. The isolated-process strategy lives in `process`.

use fetchbench_core::error::StrategyError;
use fetchbench_core::observer::{PhaseTracker, RunObserver};
use fetchbench_core::task::FetchTask;
use fetchbench_core::types::{FetchResult, StrategyKind, WorkItem};
use parking_lot::Mutex;
use tracing::debug;

use crate::collector::{LocalCollector, ResultCollector, SharedCollector};

/// One interchangeable algorithm for running a batch of work items.
pub trait ExecutionStrategy: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Run every item exactly once and return one result per item.
    ///
    /// Item failures are reported as `FetchResult::Err`; an `Err` return
    /// means the run itself failed.
    fn execute(
        &self,
        items: &[WorkItem],
        observer: &dyn RunObserver,
    ) -> Result<Vec<FetchResult>, StrategyError>;

    /// Name used in logs and reports.
    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// One logical worker; results come back in task-source order.
pub struct SequentialStrategy {
    task: FetchTask,
}

impl SequentialStrategy {
    #[must_use]
    pub fn new(task: FetchTask) -> Self {
        Self { task }
    }
}

impl ExecutionStrategy for SequentialStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sequential
    }

    fn execute(
        &self,
        items: &[WorkItem],
        observer: &dyn RunObserver,
    ) -> Result<Vec<FetchResult>, StrategyError> {
        let mut tracker = PhaseTracker::new(self.kind(), observer);
        let mut collector = LocalCollector::new(items.len());

        tracker.dispatch()?;
        for item in items {
            let result = self.task.execute(item);
            tracker.item(&result);
            collector.collect(result);
        }

        tracker.drain()?;
        let results = collector.drain_all()?;
        tracker.finish(items.len(), results.len(), items.len())?;
        Ok(results)
    }
}

/// One thread per item, all sharing the task's fetcher.
///
/// When the fetcher reports that it is not thread-safe, calls into it are
/// serialized behind a per-run mutex.
pub struct SharedMemoryStrategy {
    task: FetchTask,
}

impl SharedMemoryStrategy {
    #[must_use]
    pub fn new(task: FetchTask) -> Self {
        Self { task }
    }
}

impl ExecutionStrategy for SharedMemoryStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ConcurrentSharedMemory
    }

    fn execute(
        &self,
        items: &[WorkItem],
        observer: &dyn RunObserver,
    ) -> Result<Vec<FetchResult>, StrategyError> {
        let kind = self.kind();
        let expected = items.len();
        let mut tracker = PhaseTracker::new(kind, observer);
        let collector = SharedCollector::new(expected);
        let gate = (!self.task.fetcher().is_thread_safe()).then(|| Mutex::new(()));
        if gate.is_some() {
            debug!(fetcher = self.task.fetcher().name(), "Serializing access to shared fetcher");
        }
        let task = &self.task;
        let gate = gate.as_ref();

        tracker.dispatch()?;
        let joined = crossbeam::thread::scope(|s| -> Result<usize, StrategyError> {
            let mut handles = Vec::with_capacity(expected);
            for (index, item) in items.iter().enumerate() {
                let mut writer = collector.clone();
                let handle = s
                    .builder()
                    .name(format!("fetch-{index}"))
                    .spawn(move |_| {
                        let result = {
                            let _guard = gate.map(|g| g.lock());
                            task.execute(item)
                        };
                        observer.on_item(kind, &result);
                        writer.collect(result);
                    })
                    .map_err(|e| StrategyError::Spawn(e.to_string()))?;
                handles.push(handle);
            }

            tracker.drain()?;
            let mut joined = 0;
            for handle in handles {
                handle
                    .join()
                    .map_err(|_| StrategyError::Worker("fetch thread panicked".into()))?;
                joined += 1;
            }
            Ok(joined)
        })
        .map_err(|_| StrategyError::Worker("fetch thread panicked".into()))??;

        let results = collector.drain_all()?;
        tracker.finish(joined, results.len(), expected)?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use fetchbench_core::error::FetchError;
    use fetchbench_core::fetcher::Fetcher;
    use fetchbench_core::observer::NoOpObserver;

    struct SleepyFetcher {
        delay: Duration,
        fail: &'static str,
    }

    impl Fetcher for SleepyFetcher {
        fn fetch(&self, key: &str) -> Result<String, FetchError> {
            std::thread::sleep(self.delay);
            if key == self.fail {
                Err(FetchError::Other(format!("{key} failed")))
            } else {
                Ok(key.to_uppercase())
            }
        }

        fn name(&self) -> &str {
            "sleepy"
        }
    }

    /// Not thread-safe: counts overlapping calls.
    struct ExclusiveFetcher {
        active: AtomicUsize,
        overlaps: AtomicUsize,
    }

    impl Fetcher for ExclusiveFetcher {
        fn fetch(&self, key: &str) -> Result<String, FetchError> {
            if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_millis(5));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(key.to_string())
        }

        fn name(&self) -> &str {
            "exclusive"
        }

        fn is_thread_safe(&self) -> bool {
            false
        }
    }

    fn items(n: usize) -> Vec<WorkItem> {
        (0..n)
            .map(|i| WorkItem::new(format!("item-{i}")).unwrap())
            .collect()
    }

    fn sleepy(delay_ms: u64, fail: &'static str) -> FetchTask {
        FetchTask::new(Arc::new(SleepyFetcher {
            delay: Duration::from_millis(delay_ms),
            fail,
        }))
    }

    #[test]
    fn sequential_preserves_order() {
        let strategy = SequentialStrategy::new(sleepy(0, ""));
        let results = strategy.execute(&items(4), &NoOpObserver::new()).unwrap();
        let keys: Vec<&str> = results.iter().map(FetchResult::key).collect();
        assert_eq!(keys, ["item-0", "item-1", "item-2", "item-3"]);
    }

    #[test]
    fn sequential_elapsed_is_sum_of_delays() {
        let strategy = SequentialStrategy::new(sleepy(100, ""));
        let start = Instant::now();
        let results = strategy.execute(&items(3), &NoOpObserver::new()).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(results.iter().all(FetchResult::is_ok));
    }

    #[test]
    fn shared_memory_runs_concurrently() {
        let strategy = SharedMemoryStrategy::new(sleepy(100, ""));
        let start = Instant::now();
        let results = strategy.execute(&items(3), &NoOpObserver::new()).unwrap();
        let elapsed = start.elapsed();
        assert_eq!(results.len(), 3);
        assert!(elapsed < Duration::from_millis(300), "took {elapsed:?}");
    }

    #[test]
    fn shared_memory_isolates_errors() {
        let strategy = SharedMemoryStrategy::new(sleepy(1, "item-2"));
        let results = strategy.execute(&items(5), &NoOpObserver::new()).unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn shared_memory_empty_batch() {
        let strategy = SharedMemoryStrategy::new(sleepy(0, ""));
        assert!(strategy.execute(&[], &NoOpObserver::new()).unwrap().is_empty());
    }

    #[test]
    fn shared_memory_serializes_unsafe_fetcher() {
        let fetcher = Arc::new(ExclusiveFetcher {
            active: AtomicUsize::new(0),
            overlaps: AtomicUsize::new(0),
        });
        let strategy = SharedMemoryStrategy::new(FetchTask::new(fetcher.clone()));
        let results = strategy.execute(&items(8), &NoOpObserver::new()).unwrap();
        assert_eq!(results.len(), 8);
        assert_eq!(fetcher.overlaps.load(Ordering::SeqCst), 0);
    }
}
