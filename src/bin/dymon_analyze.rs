//! Offline analyzer entry point.
//!
//! Replays a persisted event log through the same aggregation logic used
//! live, prints and saves the textual report, and exports the multi-sheet
//! analysis workbook.

use clap::Parser;
use dymon::{export_workbook, load_directory, logging, render_report, replay, LoadError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dymon-analyze", about = "Analyze captured live room data")]
struct Cli {
    /// Directory containing live_messages_*.json files
    data_dir: PathBuf,

    /// Report output path (default: <data_dir>/analysis_report.txt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Workbook export path (default: <data_dir>/live_analysis.xlsx)
    #[arg(long)]
    excel: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init()?;

    let loaded = match load_directory(&cli.data_dir) {
        Ok(loaded) => loaded,
        Err(LoadError::MissingDirectory(path)) => {
            // configuration error: report and end without raising
            tracing::error!("❌ data directory not found: {}", path.display());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if loaded.events.is_empty() {
        tracing::error!(
            "❌ no event data found in {}",
            cli.data_dir.display()
        );
        return Ok(());
    }

    tracing::info!("✅ loaded {} events", loaded.events.len());
    if loaded.decode_errors > 0 {
        tracing::warn!("skipped {} undecodable records", loaded.decode_errors);
    }

    let state = replay(&loaded.events);
    let report = render_report(&state, loaded.stats.as_ref());
    println!("{}", report);

    let report_path = cli
        .output
        .unwrap_or_else(|| cli.data_dir.join("analysis_report.txt"));
    std::fs::write(&report_path, &report)?;
    tracing::info!("📄 report saved to {}", report_path.display());

    let excel_path = cli
        .excel
        .unwrap_or_else(|| cli.data_dir.join("live_analysis.xlsx"));
    if export_workbook(&state, &excel_path)? {
        tracing::info!("📊 workbook saved to {}", excel_path.display());
    } else {
        tracing::info!("nothing to export, workbook skipped");
    }

    Ok(())
}
