//! Event persistence strategies.
//!
//! Two sink families share one trait: the immediate-append NDJSON sink
//! (durability window of one event) and the buffered batch sink for tabular
//! targets (durability window of up to `threshold - 1` events). The format
//! is selected once per run; write failures are fatal for the run and are
//! never retried here.

use crate::event::Event;
use std::path::Path;
use thiserror::Error;

pub mod batch;
pub mod ndjson;
pub mod row;
pub mod stats;

pub use batch::BatchSink;
pub use ndjson::NdjsonSink;
pub use row::{EventRow, COLUMNS};
pub use stats::{write_stats, PersistedStats, STATS_FILE_STEM};

/// Errors raised by sink operations. Sink I/O failures are not retried.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

/// Output format selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// NDJSON, immediate append (one durable record per event).
    Json,
    /// CSV table, buffered batch flush.
    Csv,
    /// XLSX worksheet, buffered batch flush.
    Xlsx,
}

impl OutputFormat {
    pub fn file_extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_extension())
    }
}

/// A persistence strategy for raw events.
///
/// `close` is the scoped teardown: flush-then-release, guaranteed on normal
/// stream end and operator cancellation, not on abrupt process termination.
pub trait EventSink {
    fn append(&mut self, event: &Event) -> Result<(), SinkError>;
    fn flush(&mut self) -> Result<(), SinkError>;
    fn close(&mut self) -> Result<(), SinkError>;
    fn target_path(&self) -> &Path;
}

/// Data-file name for one run, e.g. `live_messages_20240501_203000.csv`.
pub fn data_file_name(format: OutputFormat, stamp: &str) -> String {
    format!("live_messages_{}.{}", stamp, format.file_extension())
}

/// Create the sink for the selected format inside `dir` (created if absent).
pub fn create_sink(
    format: OutputFormat,
    dir: &Path,
    stamp: &str,
) -> Result<Box<dyn EventSink>, SinkError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(data_file_name(format, stamp));
    match format {
        OutputFormat::Json => Ok(Box::new(NdjsonSink::create(path)?)),
        OutputFormat::Csv => Ok(Box::new(BatchSink::csv(path))),
        OutputFormat::Xlsx => Ok(Box::new(BatchSink::xlsx(path))),
    }
}

/// Quote a CSV field when it contains the delimiter, quotes or line breaks.
pub(crate) fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
