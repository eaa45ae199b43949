//! Multi-sheet workbook export of an [`AggregateState`].
//!
//! One sheet per aggregate; an aggregate with no data yields no sheet, and
//! a state with no events yields no workbook at all.

use crate::analytics::aggregator::AggregateState;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use thiserror::Error;
use tracing::info;

const TOP_N: usize = 20;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("workbook error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the analysis workbook. Returns `None` when every aggregate is
/// empty (nothing to export).
pub fn build_workbook(state: &AggregateState) -> Result<Option<Workbook>, ExportError> {
    let mut workbook = Workbook::new();
    let mut sheets = 0usize;

    if !state.type_counts.is_empty() {
        let rows: Vec<(String, u64)> = state
            .type_counts
            .iter()
            .map(|(kind, &count)| (kind.to_string(), count))
            .collect();
        write_count_sheet(&mut workbook, "Event Types", ("message_type", "count"), &rows)?;
        sheets += 1;
    }

    if !state.chat_counts.is_empty() {
        let rows = owned(state.top_chatters(TOP_N));
        write_count_sheet(&mut workbook, "Top Chatters", ("user_id", "messages"), &rows)?;
        sheets += 1;
    }

    if !state.gift_name_totals.is_empty() {
        let rows = owned(state.top_gift_names(TOP_N));
        write_count_sheet(&mut workbook, "Gift Totals", ("gift_name", "count"), &rows)?;
        sheets += 1;
    }

    if !state.gift_contribution.is_empty() {
        let rows = owned(state.top_gifters(TOP_N));
        write_count_sheet(&mut workbook, "Top Gifters", ("user_id", "gift_count"), &rows)?;
        sheets += 1;
    }

    if !state.hourly_counts.is_empty() {
        let rows: Vec<(String, u64)> = state
            .hourly_counts
            .iter()
            .map(|(hour, &count)| (format!("{:02}", hour), count))
            .collect();
        write_count_sheet(&mut workbook, "Hourly Activity", ("hour", "events"), &rows)?;
        sheets += 1;
    }

    if !state.gift_timeline.is_empty() {
        let worksheet = workbook.add_worksheet().set_name("Gift Timeline")?;
        write_header(
            worksheet,
            &["timestamp", "gift_name", "giver_id", "combo_count"],
        )?;
        for (idx, entry) in state.gift_timeline.iter().enumerate() {
            let row = (idx + 1) as u32;
            worksheet.write_string(row, 0, &entry.timestamp)?;
            worksheet.write_string(row, 1, &entry.gift_name)?;
            worksheet.write_string(row, 2, &entry.giver_id)?;
            worksheet.write_number(row, 3, entry.combo_count as f64)?;
        }
        sheets += 1;
    }

    if sheets == 0 {
        return Ok(None);
    }
    Ok(Some(workbook))
}

/// Save the workbook to `path`. Returns `false` when the state had nothing
/// to export (no file is written).
pub fn export_workbook(state: &AggregateState, path: &Path) -> Result<bool, ExportError> {
    match build_workbook(state)? {
        Some(mut workbook) => {
            workbook.save(path)?;
            info!("analysis workbook written to {}", path.display());
            Ok(true)
        }
        None => Ok(false),
    }
}

fn write_count_sheet(
    workbook: &mut Workbook,
    name: &str,
    headers: (&str, &str),
    rows: &[(String, u64)],
) -> Result<(), ExportError> {
    let worksheet = workbook.add_worksheet().set_name(name)?;
    write_header(worksheet, &[headers.0, headers.1])?;
    for (idx, (label, count)) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        worksheet.write_string(row, 0, label)?;
        worksheet.write_number(row, 1, *count as f64)?;
    }
    Ok(())
}

fn write_header(worksheet: &mut Worksheet, headers: &[&str]) -> Result<(), ExportError> {
    let header_format = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    Ok(())
}

fn owned(entries: Vec<(&str, u64)>) -> Vec<(String, u64)> {
    entries
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect()
}
