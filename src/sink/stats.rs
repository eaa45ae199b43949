//! Scalar stats snapshot, written at stream end.
//!
//! Only scalar summary metrics are persisted; the richer maps (top-K,
//! histogram, timeline) live in the in-process [`AggregateState`] and are
//! recomputed offline from the raw event log. This asymmetry between live
//! and snapshot-restored state is deliberate.

use super::{escape_csv_field, OutputFormat, SinkError};
use crate::analytics::aggregator::AggregateState;
use crate::event::EventKind;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File stem of the per-run stats snapshot (`live_stats.<ext>`).
pub const STATS_FILE_STEM: &str = "live_stats";

/// The persisted scalar summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedStats {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub total_chats: u64,
    #[serde(default)]
    pub total_gifts: u64,
    #[serde(default)]
    pub total_likes: u64,
    #[serde(default)]
    pub total_enters: u64,
    #[serde(default)]
    pub total_follows: u64,
    #[serde(default)]
    pub unique_users_count: u64,
}

impl PersistedStats {
    pub fn from_state(state: &AggregateState) -> Self {
        let count = |kind: EventKind| state.type_counts.get(&kind).copied().unwrap_or(0);
        Self {
            start_time: state.start_time.clone().unwrap_or_default(),
            end_time: state.end_time.clone().unwrap_or_default(),
            total_messages: state.total_messages,
            total_chats: count(EventKind::Message),
            total_gifts: count(EventKind::Gift),
            total_likes: count(EventKind::Like),
            total_enters: count(EventKind::Enter),
            total_follows: count(EventKind::Follow),
            unique_users_count: state.unique_users.len() as u64,
        }
    }

    /// `(metric, value)` rows for the two-column tabular form.
    pub fn metric_rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start_time", self.start_time.clone()),
            ("end_time", self.end_time.clone()),
            ("total_messages", self.total_messages.to_string()),
            ("total_chats", self.total_chats.to_string()),
            ("total_gifts", self.total_gifts.to_string()),
            ("total_likes", self.total_likes.to_string()),
            ("total_enters", self.total_enters.to_string()),
            ("total_follows", self.total_follows.to_string()),
            ("unique_users_count", self.unique_users_count.to_string()),
        ]
    }
}

/// Serialize the aggregate's scalar summary to `live_stats.<ext>` in `dir`.
pub fn write_stats(
    state: &AggregateState,
    dir: &Path,
    format: OutputFormat,
) -> Result<PathBuf, SinkError> {
    let stats = PersistedStats::from_state(state);
    let path = dir.join(format!("{}.{}", STATS_FILE_STEM, format.file_extension()));

    match format {
        OutputFormat::Json => {
            let body = serde_json::to_string_pretty(&stats)?;
            std::fs::write(&path, body + "\n")?;
        }
        OutputFormat::Csv => {
            let mut out = String::from("metric,value\n");
            for (metric, value) in stats.metric_rows() {
                out.push_str(&format!("{},{}\n", metric, escape_csv_field(&value)));
            }
            std::fs::write(&path, out)?;
        }
        OutputFormat::Xlsx => {
            let mut workbook = Workbook::new();
            let worksheet = workbook.add_worksheet().set_name("Stats")?;
            let header_format = Format::new().set_bold();
            worksheet.write_string_with_format(0, 0, "metric", &header_format)?;
            worksheet.write_string_with_format(0, 1, "value", &header_format)?;
            for (row, (metric, value)) in stats.metric_rows().iter().enumerate() {
                worksheet.write_string((row + 1) as u32, 0, *metric)?;
                worksheet.write_string((row + 1) as u32, 1, value)?;
            }
            workbook.save(&path)?;
        }
    }

    Ok(path)
}
