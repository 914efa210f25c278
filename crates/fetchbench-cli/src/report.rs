//! CSV persistence: the aggregate results table and per-key records.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::debug;

use fetchbench_core::fetcher::RecordSink;
use fetchbench_core::types::{AggregateStats, StrategyKind};
use fetchbench_orchestration::interfaces::{ReportError, Reporter};

/// Columns of the aggregate table.
pub const AGGREGATE_HEADER: [&str; 7] = [
    "Method",
    "Average Time (seconds)",
    "Std Dev (seconds)",
    "Trials",
    "Failed Trials",
    "Items per Trial",
    "Payload Size",
];

/// Columns of a per-key record file.
pub const RECORD_HEADER: [&str; 3] = ["Index", "Key", "Payload"];

fn csv_error(e: csv::Error) -> ReportError {
    ReportError::Csv(e.to_string())
}

/// Appends one row per aggregate to a CSV file.
///
/// The header is written only when the file is missing or empty.
#[derive(Debug, Clone)]
pub struct CsvReporter {
    path: PathBuf,
}

impl CsvReporter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for CsvReporter {
    fn append_row(&self, stats: &AggregateStats) -> Result<(), ReportError> {
        let needs_header = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer.write_record(AGGREGATE_HEADER).map_err(csv_error)?;
        }
        writer
            .write_record([
                stats.strategy.name().to_string(),
                format!("{:.6}", stats.mean_seconds),
                format!("{:.6}", stats.stddev_seconds),
                stats.sample_count.to_string(),
                stats.failed_trials.to_string(),
                stats.workload.item_count.to_string(),
                stats.workload.payload_size_target.to_string(),
            ])
            .map_err(csv_error)?;
        writer.flush()?;
        debug!(path = %self.path.display(), strategy = %stats.strategy, "Appended aggregate row");
        Ok(())
    }
}

/// Writes `<strategy>_<key>.csv` into a directory, one row per paragraph.
#[derive(Debug, Clone)]
pub struct CsvRecordSink {
    dir: PathBuf,
    strategy: StrategyKind,
}

impl CsvRecordSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, strategy: StrategyKind) -> Self {
        Self {
            dir: dir.into(),
            strategy,
        }
    }

    /// File a key's record is written to.
    ///
    /// Distinct keys always map to distinct files: spaces become `_` and
    /// every other character outside `[A-Za-z0-9-]` (including `_`) is
    /// written as `%XX` per UTF-8 byte.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut safe = String::with_capacity(key.len());
        for c in key.chars() {
            if c.is_ascii_alphanumeric() || c == '-' {
                safe.push(c);
            } else if c == ' ' {
                safe.push('_');
            } else {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    safe.push_str(&format!("%{byte:02X}"));
                }
            }
        }
        self.dir.join(format!("{}_{safe}.csv", self.strategy.slug()))
    }
}

impl RecordSink for CsvRecordSink {
    fn record(&self, key: &str, payload: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut writer = WriterBuilder::new().from_path(self.path_for(key))?;
        writer.write_record(RECORD_HEADER)?;
        for (index, part) in payload
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .enumerate()
        {
            writer.write_record([(index + 1).to_string().as_str(), key, part])?;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchbench_core::types::WorkloadParams;

    fn stats(strategy: StrategyKind, mean: f64) -> AggregateStats {
        AggregateStats {
            strategy,
            mean_seconds: mean,
            stddev_seconds: 0.01,
            sample_count: 30,
            failed_trials: 0,
            workload: WorkloadParams::new(5, 1200),
        }
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CsvReporter::new(dir.path().join("results.csv"));
        reporter.append_row(&stats(StrategyKind::Sequential, 1.5)).unwrap();
        reporter
            .append_row(&stats(StrategyKind::ConcurrentSharedMemory, 0.4))
            .unwrap();

        let text = fs::read_to_string(reporter.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], AGGREGATE_HEADER.join(","));
        assert!(lines[1].starts_with("Sequential,1.500000,0.010000,30,0,5,1200"));
        assert!(lines[2].starts_with("ConcurrentSharedMemory,0.400000"));
    }

    #[test]
    fn existing_file_gets_no_new_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        CsvReporter::new(&path)
            .append_row(&stats(StrategyKind::Sequential, 1.0))
            .unwrap();
        CsvReporter::new(&path)
            .append_row(&stats(StrategyKind::Sequential, 1.1))
            .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Method,").count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = CsvReporter::new(dir.path().join("missing").join("results.csv"));
        assert!(matches!(
            reporter.append_row(&stats(StrategyKind::Sequential, 1.0)),
            Err(ReportError::Io(_))
        ));
    }

    #[test]
    fn record_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvRecordSink::new(dir.path().join("records"), StrategyKind::ConcurrentIsolatedProcess);
        sink.record("Computer science", "First paragraph.\n\nSecond, with comma.")
            .unwrap();

        let path = sink.path_for("Computer science");
        assert_eq!(path.file_name().unwrap(), "processes_Computer_science.csv");
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "2");
        assert_eq!(&rows[1][1], "Computer science");
        assert_eq!(&rows[1][2], "Second, with comma.");
    }

    #[test]
    fn record_key_is_sanitized() {
        let sink = CsvRecordSink::new("/tmp", StrategyKind::Sequential);
        assert_eq!(
            sink.path_for("a/b:c").file_name().unwrap(),
            "sequential_a%2Fb%3Ac.csv"
        );
        assert_eq!(
            sink.path_for("Café").file_name().unwrap(),
            "sequential_Caf%C3%A9.csv"
        );
    }

    #[test]
    fn similar_keys_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvRecordSink::new(dir.path(), StrategyKind::ConcurrentSharedMemory);
        let keys = ["a/b", "a_b", "a b", "a:b", "a%2Fb"];

        let paths: std::collections::HashSet<PathBuf> =
            keys.iter().map(|k| sink.path_for(k)).collect();
        assert_eq!(paths.len(), keys.len());

        for key in keys {
            sink.record(key, &format!("payload of {key}")).unwrap();
        }
        for key in keys {
            let mut reader = csv::Reader::from_path(sink.path_for(key)).unwrap();
            let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
            assert_eq!(&rows[0][1], key);
        }
    }
}
