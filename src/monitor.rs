//! Live ingestion pipeline.
//!
//! Drives the fan-out loop on one logical thread of control: every event
//! from the source is normalized once, then handed to both the aggregator
//! and the sink. Teardown (final flush, stats snapshot) runs on normal end
//! of stream and on Ctrl-C; an abrupt kill is the stated durability
//! boundary.

use crate::analytics::aggregator::{AggregateState, Aggregator};
use crate::event::{Event, EventPayload};
use crate::sink::{create_sink, write_stats, OutputFormat, PersistedStats};
use crate::source::EventSource;
use anyhow::Context;
use chrono::{Local, SecondsFormat};
use std::path::PathBuf;
use tracing::{info, warn};

/// Per-run monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub room_id: String,
    pub save_path: PathBuf,
    pub format: OutputFormat,
}

impl MonitorConfig {
    pub fn new(room_id: impl Into<String>, save_path: PathBuf, format: OutputFormat) -> Self {
        Self {
            room_id: room_id.into(),
            save_path,
            format,
        }
    }
}

/// Outcome of one monitor run, for the closing summary.
#[derive(Debug)]
pub struct MonitorSummary {
    pub stats: PersistedStats,
    pub state: AggregateState,
    pub data_file: PathBuf,
    pub stats_file: PathBuf,
}

/// Extract the numeric room ID from direct input or a live-room URL.
///
/// A URL like `https://live.douyin.com/900013148868?foo=1` yields the first
/// path segment; plain digits pass through unchanged; anything else is
/// returned as-is and left to the transport client to reject.
pub fn extract_room_id(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.to_string();
    }
    if let Some(rest) = trimmed.split("live.douyin.com").nth(1) {
        let path = rest.trim_start_matches('/');
        if let Some(segment) = path.split(['/', '?', '#']).next() {
            if !segment.is_empty() {
                return segment.to_string();
            }
        }
    }
    trimmed.to_string()
}

/// Run the ingestion loop until the source ends or the operator interrupts,
/// then tear down: close the sink, stamp the aggregate and persist the
/// scalar stats snapshot.
pub async fn run_monitor(
    mut source: impl EventSource,
    config: &MonitorConfig,
) -> anyhow::Result<MonitorSummary> {
    std::fs::create_dir_all(&config.save_path).with_context(|| {
        format!(
            "failed to create save directory {}",
            config.save_path.display()
        )
    })?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut sink = create_sink(config.format, &config.save_path, &stamp)?;
    let mut aggregator = Aggregator::new();

    info!("📁 save path: {}", config.save_path.display());
    info!("📄 data file: {}", sink.target_path().display());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("🛑 interrupt received, closing the stream");
                break;
            }
            maybe_raw = source.next_event() => {
                match maybe_raw? {
                    Some(raw) => {
                        let event = Event::capture(&raw.kind, raw.fields);
                        log_event(&event);
                        aggregator.update(&event);
                        // sink write failures are fatal for the run
                        sink.append(&event)?;
                    }
                    None => {
                        info!("event source ended");
                        break;
                    }
                }
            }
        }
    }

    sink.close()?;
    aggregator.finish(Local::now().to_rfc3339_opts(SecondsFormat::Micros, false));

    let state = aggregator.into_state();
    let stats_file = write_stats(&state, &config.save_path, config.format)?;
    info!("📊 stats snapshot written to {}", stats_file.display());

    Ok(MonitorSummary {
        stats: PersistedStats::from_state(&state),
        data_file: sink.target_path().to_path_buf(),
        stats_file,
        state,
    })
}

fn log_event(event: &Event) {
    match &event.payload {
        EventPayload::Message(data) => {
            info!("[message] {} ({}): {}", data.nickname, data.user_id, data.content);
        }
        EventPayload::Gift(data) => {
            info!(
                "[gift] {} sent {} x{} to {}",
                data.giver_nickname, data.gift_name, data.combo_count, data.receiver_nickname
            );
        }
        EventPayload::Like(data) => {
            info!(
                "[like] {} liked {} times (room total {})",
                data.nickname, data.count, data.total
            );
        }
        EventPayload::Enter(data) => {
            info!(
                "[enter] {} entered the room ({} watching)",
                data.nickname, data.member_count
            );
        }
        EventPayload::Follow(data) => {
            info!(
                "[follow] {} followed the host (follows {})",
                data.nickname, data.follow_count
            );
        }
        EventPayload::RoomStats(data) => {
            info!("[room_stats] {}", data.display_long);
        }
        EventPayload::Unknown(_) => {
            warn!("[unknown] unclassified event retained verbatim");
        }
    }
}

impl MonitorSummary {
    /// Closing summary block, printed by the monitor binary.
    pub fn render(&self) -> String {
        let stats = &self.stats;
        let mut out = String::new();
        out.push_str("==================================================\n");
        out.push_str("📊 Live monitoring summary\n");
        out.push_str("==================================================\n");
        out.push_str(&format!("⏰ Start time: {}\n", stats.start_time));
        out.push_str(&format!("⏰ End time: {}\n", stats.end_time));
        out.push_str(&format!("💬 Total events: {}\n", stats.total_messages));
        out.push_str(&format!("🎁 Gifts: {}\n", stats.total_gifts));
        out.push_str(&format!("👍 Likes: {}\n", stats.total_likes));
        out.push_str(&format!("🚪 Entries: {}\n", stats.total_enters));
        out.push_str(&format!("❤️ Follows: {}\n", stats.total_follows));
        out.push_str(&format!("👥 Unique users: {}\n", stats.unique_users_count));

        if let Some((user_id, count)) = self.state.top_chatters(1).first() {
            out.push_str(&format!("💬 Most active chatter: {} ({} messages)\n", user_id, count));
        }
        if let Some((user_id, count)) = self.state.top_gifters(1).first() {
            out.push_str(&format!("🎁 Top gift contributor: {} ({} gifts)\n", user_id, count));
        }

        out.push_str("==================================================\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_room_id_from_digits() {
        assert_eq!(extract_room_id("900013148868"), "900013148868");
        assert_eq!(extract_room_id("  42  "), "42");
    }

    #[test]
    fn test_extract_room_id_from_url() {
        assert_eq!(
            extract_room_id("https://live.douyin.com/900013148868"),
            "900013148868"
        );
        assert_eq!(
            extract_room_id("https://live.douyin.com/900013148868?enter_from=web"),
            "900013148868"
        );
        assert_eq!(
            extract_room_id("live.douyin.com/777/extra"),
            "777"
        );
    }

    #[test]
    fn test_extract_room_id_passthrough() {
        assert_eq!(extract_room_id("not-a-room"), "not-a-room");
        assert_eq!(extract_room_id("https://live.douyin.com/"), "https://live.douyin.com/");
    }
}
