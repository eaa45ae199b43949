//! Running aggregation, report rendering and workbook export.

pub mod aggregator;
pub mod export;
pub mod report;

pub use aggregator::{top_k, AggregateState, Aggregator, GiftTimelineEntry};
pub use export::{build_workbook, export_workbook, ExportError};
pub use report::render_report;
