pub mod analytics;
pub mod event;
pub mod logging;
pub mod monitor;
pub mod replay;
pub mod sink;
pub mod source;

// Re-export the core pipeline types for convenience
pub use analytics::{
    export_workbook, render_report, AggregateState, Aggregator, ExportError, GiftTimelineEntry,
};
pub use event::{Event, EventKind, EventPayload};
pub use monitor::{extract_room_id, run_monitor, MonitorConfig, MonitorSummary};
pub use replay::{load_directory, replay, LoadError, LoadedData};
pub use sink::{
    create_sink, write_stats, EventSink, OutputFormat, PersistedStats, SinkError, STATS_FILE_STEM,
};
pub use source::{EventSource, RawEvent, SimulatedSource};
