//! # fetchbench-cli
//!
//! Terminal output, CSV reporting, progress display, and shell completion.

pub mod completion;
pub mod output;
pub mod presenter;
pub mod progress;
pub mod report;
pub mod ui;

pub use presenter::CliPresenter;
pub use progress::ProgressObserver;
pub use report::{CsvRecordSink, CsvReporter};
