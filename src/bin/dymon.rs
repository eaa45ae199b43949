//! Live room monitor entry point.
//!
//! Captures a room's event stream, keeps running statistics and persists
//! every event in the selected format. The real transport client is an
//! external collaborator; this build ships a simulated source for
//! development, selected with `--simulate`.

use clap::Parser;
use dymon::{
    extract_room_id, logging, run_monitor, MonitorConfig, OutputFormat, SimulatedSource,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dymon", about = "Douyin live room monitor with data capture")]
struct Cli {
    /// Room ID or live-room URL (e.g. 900013148868 or
    /// https://live.douyin.com/900013148868)
    room: String,

    /// Data save directory (default: live_data_<room_id>)
    #[arg(long)]
    save_path: Option<PathBuf>,

    /// Output format for the event log and stats snapshot
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Drive the built-in simulated event source instead of a live
    /// transport client (development / demo)
    #[arg(long)]
    simulate: bool,

    /// Also write tracing output to <save-path>/dymon.log
    #[arg(long)]
    log_file: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let room_id = extract_room_id(&cli.room);
    let save_path = cli
        .save_path
        .unwrap_or_else(|| PathBuf::from(format!("live_data_{}", room_id)));

    let _log_guard = if cli.log_file {
        Some(logging::init_with_log_file(&save_path)?)
    } else {
        logging::init()?;
        None
    };

    if !cli.simulate {
        // the protocol client (auth, websocket, frame decoding) is not
        // bundled with this crate; see the EventSource boundary
        tracing::error!(
            "no live transport client is configured in this build; \
             re-run with --simulate to drive the built-in simulated source"
        );
        return Ok(());
    }

    tracing::info!("🎯 monitoring room {}", room_id);
    tracing::info!("📄 output format: {}", cli.format);
    tracing::info!("press Ctrl+C to stop");

    let source = SimulatedSource::new(room_id.clone());
    let config = MonitorConfig::new(room_id, save_path, cli.format);
    let summary = run_monitor(source, &config).await?;

    println!("{}", summary.render());
    println!("📄 event data saved to: {}", summary.data_file.display());
    println!("📊 stats snapshot saved to: {}", summary.stats_file.display());

    Ok(())
}
