//! Strategy factory, registry, and selection.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use fetchbench_core::error::StrategyError;
use fetchbench_core::fetcher::RecordSink;
use fetchbench_core::task::FetchTask;
use fetchbench_core::types::StrategyKind;

use crate::process::{IsolatedProcessStrategy, WorkerCommand};
use crate::strategy::{ExecutionStrategy, SequentialStrategy, SharedMemoryStrategy};

/// Factory trait for creating execution strategies.
pub trait StrategyFactory: Send + Sync {
    /// Get or create the strategy of the given kind.
    fn get(&self, kind: StrategyKind) -> Result<Arc<dyn ExecutionStrategy>, StrategyError>;

    /// List the strategies this factory can build.
    fn available(&self) -> Vec<StrategyKind>;
}

/// Builds the record sink used by one strategy's tasks.
pub type RecordSinkFn = dyn Fn(StrategyKind) -> Arc<dyn RecordSink> + Send + Sync;

/// Default factory with lazy creation and cache.
///
/// The isolated-process strategy is only available when a worker command
/// has been configured.
pub struct DefaultStrategyFactory {
    task: FetchTask,
    worker: Option<WorkerCommand>,
    records: Option<Box<RecordSinkFn>>,
    cache: RwLock<HashMap<StrategyKind, Arc<dyn ExecutionStrategy>>>,
}

impl DefaultStrategyFactory {
    /// Create a factory for in-process strategies sharing `task`.
    #[must_use]
    pub fn new(task: FetchTask) -> Self {
        Self {
            task,
            worker: None,
            records: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Enable the isolated-process strategy with the given worker command.
    #[must_use]
    pub fn with_worker(mut self, worker: WorkerCommand) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Give each in-process strategy its own record sink.
    ///
    /// Isolated-process workers build their own sink in the child.
    #[must_use]
    pub fn with_records<F>(mut self, make: F) -> Self
    where
        F: Fn(StrategyKind) -> Arc<dyn RecordSink> + Send + Sync + 'static,
    {
        self.records = Some(Box::new(make));
        self
    }

    fn task_for(&self, kind: StrategyKind) -> FetchTask {
        match &self.records {
            Some(make) => self.task.clone().with_records(make(kind)),
            None => self.task.clone(),
        }
    }

    fn create_strategy(&self, kind: StrategyKind) -> Result<Arc<dyn ExecutionStrategy>, StrategyError> {
        match kind {
            StrategyKind::Sequential => Ok(Arc::new(SequentialStrategy::new(self.task_for(kind)))),
            StrategyKind::ConcurrentSharedMemory => {
                Ok(Arc::new(SharedMemoryStrategy::new(self.task_for(kind))))
            }
            StrategyKind::ConcurrentIsolatedProcess => match &self.worker {
                Some(worker) => Ok(Arc::new(IsolatedProcessStrategy::new(worker.clone()))),
                None => Err(StrategyError::Config(
                    "isolated-process strategy needs a worker command".into(),
                )),
            },
        }
    }
}

impl StrategyFactory for DefaultStrategyFactory {
    fn get(&self, kind: StrategyKind) -> Result<Arc<dyn ExecutionStrategy>, StrategyError> {
        if let Some(strategy) = self.cache.read().get(&kind) {
            return Ok(Arc::clone(strategy));
        }

        let strategy = self.create_strategy(kind)?;
        self.cache.write().insert(kind, Arc::clone(&strategy));
        Ok(strategy)
    }

    fn available(&self) -> Vec<StrategyKind> {
        StrategyKind::ALL
            .into_iter()
            .filter(|kind| *kind != StrategyKind::ConcurrentIsolatedProcess || self.worker.is_some())
            .collect()
    }
}

/// Get the strategies to run for a `--strategy` selection (`all` or one name).
pub fn select_strategies(
    selection: &str,
    factory: &dyn StrategyFactory,
) -> Result<Vec<Arc<dyn ExecutionStrategy>>, StrategyError> {
    if selection.eq_ignore_ascii_case("all") {
        return factory.available().into_iter().map(|k| factory.get(k)).collect();
    }
    let kind: StrategyKind = selection.parse()?;
    Ok(vec![factory.get(kind)?])
}
