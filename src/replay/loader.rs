//! Persisted event log loader.
//!
//! Reads zero or more `live_messages_*.json` append targets from a data
//! directory, concatenated in filename order. Each line is decoded
//! independently: blank lines are tolerated and a line that fails to decode
//! is skipped and counted, never aborting the load. An optional
//! `live_stats.json` snapshot is picked up alongside.

use crate::event::Event;
use crate::sink::PersistedStats;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("data directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Result of loading one data directory.
#[derive(Debug)]
pub struct LoadedData {
    /// Events concatenated across files in filename order (no re-sort).
    pub events: Vec<Event>,
    /// Scalar stats snapshot, when `live_stats.json` is present and valid.
    pub stats: Option<PersistedStats>,
    /// Lines that failed to decode and were skipped.
    pub decode_errors: usize,
}

/// Load every persisted event from `dir`.
pub fn load_directory(dir: &Path) -> Result<LoadedData, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::MissingDirectory(dir.to_path_buf()));
    }

    let pattern = dir.join("live_messages_*.json");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(Result::ok)
        .collect();
    // Filename order is the replay order contract; only the gift timeline
    // can observe interleaving across files.
    files.sort();

    let mut events = Vec::new();
    let mut decode_errors = 0;

    for path in &files {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut file_events = 0usize;

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match Event::from_json_line(&line) {
                Ok(event) => {
                    events.push(event);
                    file_events += 1;
                }
                Err(err) => {
                    decode_errors += 1;
                    debug!("skipping undecodable record in {}: {}", path.display(), err);
                }
            }
        }

        debug!("loaded {} events from {}", file_events, path.display());
    }

    let stats = load_stats(dir);

    Ok(LoadedData {
        events,
        stats,
        decode_errors,
    })
}

fn load_stats(dir: &Path) -> Option<PersistedStats> {
    let path = dir.join("live_stats.json");
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(&path) {
        Ok(body) => match serde_json::from_str(&body) {
            Ok(stats) => Some(stats),
            Err(err) => {
                warn!("ignoring unreadable stats snapshot {}: {}", path.display(), err);
                None
            }
        },
        Err(err) => {
            warn!("ignoring unreadable stats snapshot {}: {}", path.display(), err);
            None
        }
    }
}
