//! Isolated-process execution: one child process per work item.
//!
//! Each child is started from a `WorkerCommand` with the item's key appended
//! as a single `--worker-key=<KEY>` argument, so keys starting with `-` are
//! never read as flags. The child builds its own fetcher, runs a single
//! Fetch Task, and writes exactly one framed `FetchResult` to its stdout.
//!
//! The parent reads every child's stdout to end-of-stream on a dedicated
//! reader thread that forwards one result into a `ChannelCollector`. The
//! drain happens only after every child has been waited on and every reader
//! joined, so a slow child can never be missed.
//!
//! Frame format: one JSON document per line.
//!
//! ```text
//! {"status":"ok","key":"Rust","payload":"..."}\n
//! ```

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use fetchbench_core::constants::WORKER_NO_RESULT;
use fetchbench_core::error::StrategyError;
use fetchbench_core::observer::{PhaseTracker, RunObserver};
use fetchbench_core::task::FetchTask;
use fetchbench_core::types::{FetchResult, StrategyKind, WorkItem};
use thiserror::Error;
use tracing::{debug, warn};

use crate::collector::{ChannelCollector, ResultCollector, ResultProducer};
use crate::strategy::ExecutionStrategy;

/// Flag carrying the key a worker process must fetch.
pub const WORKER_KEY_FLAG: &str = "--worker-key";

/// The single argument that hands `key` to a worker process.
#[must_use]
pub fn worker_key_arg(key: &str) -> String {
    format!("{WORKER_KEY_FLAG}={key}")
}

/// Errors from reading or writing result frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("end of stream before any frame")]
    EndOfStream,
}

/// Write one result frame and flush.
pub fn write_frame<W: Write>(writer: &mut W, result: &FetchResult) -> Result<(), FrameError> {
    serde_json::to_writer(&mut *writer, result)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read the stream to its end and decode the last non-empty line.
///
/// Reading to the end keeps the child from blocking on a full pipe.
pub fn read_frame<R: Read>(reader: R) -> Result<FetchResult, FrameError> {
    let mut last = None;
    for line in BufReader::new(reader).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            last = Some(line);
        }
    }
    let line = last.ok_or(FrameError::EndOfStream)?;
    Ok(serde_json::from_str(&line)?)
}

/// Worker-side entry: fetch `key` and write its single frame to `out`.
pub fn run_worker<W: Write>(task: &FetchTask, key: &str, out: &mut W) -> Result<(), FrameError> {
    let result = match WorkItem::new(key) {
        Some(item) => task.execute(&item),
        None => FetchResult::Err {
            key: String::new(),
            message: "empty work item key".into(),
        },
    };
    write_frame(out, &result)
}

/// Program and leading arguments used to start a worker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerCommand {
    /// Start workers by running `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Start workers by re-running the current executable.
    pub fn current_exe(args: Vec<String>) -> Result<Self, StrategyError> {
        let program = std::env::current_exe()
            .map_err(|e| StrategyError::Config(format!("cannot locate current executable: {e}")))?;
        Ok(Self::new(program, args))
    }

    /// Program that is executed.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Leading arguments, before the key flag.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn spawn(&self, key: &str) -> std::io::Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(worker_key_arg(key))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
    }
}

/// One isolated worker process per item; results cross a pipe per child.
pub struct IsolatedProcessStrategy {
    command: WorkerCommand,
}

impl IsolatedProcessStrategy {
    #[must_use]
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }

    /// The command used to start workers.
    #[must_use]
    pub fn command(&self) -> &WorkerCommand {
        &self.command
    }
}

/// Kill and reap children after a failed dispatch.
fn reap(children: Vec<(&WorkItem, Child)>) {
    for (item, mut child) in children {
        if let Err(e) = child.kill() {
            debug!(key = item.key(), error = %e, "Worker already exited");
        }
        if let Err(e) = child.wait() {
            warn!(key = item.key(), error = %e, "Failed to reap worker");
        }
    }
}

/// Turn a child's stdout into exactly one result for `key`.
fn result_from_stream(key: &str, stdout: Option<ChildStdout>) -> FetchResult {
    let Some(stdout) = stdout else {
        return FetchResult::Err {
            key: key.to_string(),
            message: format!("{WORKER_NO_RESULT} (stdout not captured)"),
        };
    };
    match read_frame(stdout) {
        Ok(result) if result.key() == key => result,
        Ok(result) => FetchResult::Err {
            key: key.to_string(),
            message: format!("worker answered for key {:?}", result.key()),
        },
        Err(FrameError::EndOfStream) => FetchResult::Err {
            key: key.to_string(),
            message: WORKER_NO_RESULT.to_string(),
        },
        Err(e) => FetchResult::Err {
            key: key.to_string(),
            message: format!("{WORKER_NO_RESULT} ({e})"),
        },
    }
}

impl ExecutionStrategy for IsolatedProcessStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ConcurrentIsolatedProcess
    }

    fn execute(
        &self,
        items: &[WorkItem],
        observer: &dyn RunObserver,
    ) -> Result<Vec<FetchResult>, StrategyError> {
        let kind = self.kind();
        let expected = items.len();
        let mut tracker = PhaseTracker::new(kind, observer);
        let collector = ChannelCollector::new(expected);
        let producers = (0..expected)
            .map(|_| collector.producer())
            .collect::<Result<Vec<ResultProducer>, _>>()?;

        tracker.dispatch()?;
        let mut children = Vec::with_capacity(expected);
        for item in items {
            match self.command.spawn(item.key()) {
                Ok(child) => {
                    debug!(key = item.key(), pid = child.id(), "Spawned worker");
                    children.push((item, child));
                }
                Err(e) => {
                    reap(children);
                    return Err(StrategyError::Spawn(format!(
                        "{}: {e}",
                        self.command.program.display()
                    )));
                }
            }
        }

        tracker.drain()?;
        let joined = crossbeam::thread::scope(|s| -> Result<usize, StrategyError> {
            let mut readers = Vec::with_capacity(expected);
            for ((item, child), producer) in children.iter_mut().zip(producers) {
                let key = WorkItem::key(*item);
                let stdout = child.stdout.take();
                readers.push(s.spawn(move |_| {
                    let result = result_from_stream(key, stdout);
                    observer.on_item(kind, &result);
                    producer.deliver(result)
                }));
            }

            // Join every child first; readers finish once their pipe closes.
            let mut joined = 0;
            let mut wait_error = None;
            for (item, child) in &mut children {
                match child.wait() {
                    Ok(status) => {
                        if !status.success() {
                            warn!(key = item.key(), %status, "Worker exited unsuccessfully");
                        }
                        joined += 1;
                    }
                    Err(e) => {
                        wait_error.get_or_insert_with(|| {
                            StrategyError::Worker(format!("waiting on {}: {e}", item.key()))
                        });
                    }
                }
            }

            for reader in readers {
                let delivered = reader
                    .join()
                    .map_err(|_| StrategyError::Worker("result reader panicked".into()))?;
                if !delivered {
                    return Err(StrategyError::Channel("collector dropped early".into()));
                }
            }

            match wait_error {
                Some(e) => Err(e),
                None => Ok(joined),
            }
        })
        .map_err(|_| StrategyError::Worker("result reader panicked".into()))??;

        let results = collector.drain_all()?;
        tracker.finish(joined, results.len(), expected)?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use fetchbench_core::error::FetchError;
    use fetchbench_core::fetcher::Fetcher;

    struct UpperFetcher;

    impl Fetcher for UpperFetcher {
        fn fetch(&self, key: &str) -> Result<String, FetchError> {
            Ok(key.to_uppercase())
        }

        fn name(&self) -> &str {
            "upper"
        }
    }

    #[test]
    fn frame_round_trip() {
        let result = FetchResult::Ok {
            key: "k".into(),
            payload: "line one\nline two".into(),
        };
        let mut buf = Vec::new();
        write_frame(&mut buf, &result).unwrap();
        assert_eq!(buf.iter().filter(|&&b| b == b'\n').count(), 1);
        assert_eq!(read_frame(Cursor::new(buf)).unwrap(), result);
    }

    #[test]
    fn read_frame_takes_last_line() {
        let input = b"noise\n{\"status\":\"err\",\"key\":\"a\",\"message\":\"m\"}\n\n".to_vec();
        let result = read_frame(Cursor::new(input)).unwrap();
        assert_eq!(result.key(), "a");
        assert!(result.is_err());
    }

    #[test]
    fn read_frame_empty_stream() {
        assert!(matches!(
            read_frame(Cursor::new(Vec::new())),
            Err(FrameError::EndOfStream)
        ));
    }

    #[test]
    fn read_frame_rejects_garbage() {
        assert!(matches!(
            read_frame(Cursor::new(b"not json\n".to_vec())),
            Err(FrameError::Decode(_))
        ));
    }

    #[test]
    fn run_worker_writes_one_frame() {
        let task = FetchTask::new(Arc::new(UpperFetcher));
        let mut out = Vec::new();
        run_worker(&task, "abc", &mut out).unwrap();
        let result = read_frame(Cursor::new(out)).unwrap();
        assert_eq!(
            result,
            FetchResult::Ok {
                key: "abc".into(),
                payload: "ABC".into()
            }
        );
    }

    #[test]
    fn worker_key_is_one_argument() {
        assert_eq!(worker_key_arg("-dash"), "--worker-key=-dash");
        assert_eq!(worker_key_arg("a b"), "--worker-key=a b");
    }

    #[test]
    fn worker_command_accessors() {
        let cmd = WorkerCommand::new("/bin/true", vec!["--source".into(), "synthetic".into()]);
        assert_eq!(cmd.program(), Path::new("/bin/true"));
        assert_eq!(cmd.args().len(), 2);
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::time::{Duration, Instant};

        use fetchbench_core::observer::NoOpObserver;

        /// Worker written in shell: `sh -c SCRIPT --worker-key=KEY` puts the
        /// argument in `$0`; the script sees the bare key as `$k`.
        fn shell_worker(script: &str) -> IsolatedProcessStrategy {
            let script = format!(r#"k="${{0#--worker-key=}}"; {script}"#);
            IsolatedProcessStrategy::new(WorkerCommand::new("/bin/sh", vec!["-c".into(), script]))
        }

        fn items(keys: &[&str]) -> Vec<WorkItem> {
            keys.iter().map(|k| WorkItem::new(*k).unwrap()).collect()
        }

        const OK_SCRIPT: &str =
            r#"sleep 0.1; printf '{"status":"ok","key":"%s","payload":"done"}\n' "$k""#;

        #[test]
        fn collects_one_result_per_child() {
            let strategy = shell_worker(OK_SCRIPT);
            let start = Instant::now();
            let results = strategy
                .execute(&items(&["a", "b", "c"]), &NoOpObserver::new())
                .unwrap();
            assert_eq!(results.len(), 3);
            assert!(results.iter().all(FetchResult::is_ok));
            assert!(start.elapsed() < Duration::from_millis(300));
        }

        #[test]
        fn slow_child_is_never_missed() {
            let script = r#"if [ "$k" = slow ]; then sleep 0.5; fi; printf '{"status":"ok","key":"%s","payload":"p"}\n' "$k""#;
            let strategy = shell_worker(script);
            let results = strategy
                .execute(&items(&["fast-1", "slow", "fast-2"]), &NoOpObserver::new())
                .unwrap();
            assert_eq!(results.len(), 3);
            assert!(results.iter().any(|r| r.key() == "slow" && r.is_ok()));
        }

        #[test]
        fn crashed_child_becomes_err() {
            let script = r#"if [ "$k" = bad ]; then exit 3; fi; printf '{"status":"ok","key":"%s","payload":"p"}\n' "$k""#;
            let strategy = shell_worker(script);
            let results = strategy
                .execute(&items(&["good", "bad"]), &NoOpObserver::new())
                .unwrap();
            assert_eq!(results.len(), 2);
            let bad = results.iter().find(|r| r.key() == "bad").unwrap();
            assert_eq!(
                bad,
                &FetchResult::Err {
                    key: "bad".into(),
                    message: WORKER_NO_RESULT.into()
                }
            );
        }

        #[test]
        fn mismatched_key_becomes_err() {
            let strategy =
                shell_worker(r#"printf '{"status":"ok","key":"other","payload":"p"}\n'"#);
            let results = strategy.execute(&items(&["mine"]), &NoOpObserver::new()).unwrap();
            assert_eq!(results.len(), 1);
            assert!(results[0].is_err());
            assert_eq!(results[0].key(), "mine");
        }

        #[test]
        fn dash_prefixed_key_reaches_worker() {
            let strategy = shell_worker(OK_SCRIPT);
            let results = strategy
                .execute(&items(&["-dash", "--help"]), &NoOpObserver::new())
                .unwrap();
            assert_eq!(results.len(), 2);
            assert!(results.iter().all(FetchResult::is_ok), "{results:?}");
        }

        #[test]
        fn spawn_failure_is_strategy_error() {
            let strategy = IsolatedProcessStrategy::new(WorkerCommand::new(
                "/nonexistent/fetchbench-worker",
                Vec::new(),
            ));
            let err = strategy
                .execute(&items(&["a"]), &NoOpObserver::new())
                .unwrap_err();
            assert!(matches!(err, StrategyError::Spawn(_)));
        }

        #[test]
        fn empty_batch_spawns_nothing() {
            let strategy = IsolatedProcessStrategy::new(WorkerCommand::new(
                "/nonexistent/fetchbench-worker",
                Vec::new(),
            ));
            assert!(strategy.execute(&[], &NoOpObserver::new()).unwrap().is_empty());
        }
    }
}
