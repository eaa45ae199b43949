//! Human-readable analysis report.
//!
//! Fixed-section text rendering of an [`AggregateState`], optionally headed
//! by the persisted scalar summary when one was loaded alongside the log.

use crate::analytics::aggregator::AggregateState;
use crate::sink::PersistedStats;

const RULE: &str = "============================================================";
const TOP_N: usize = 10;
/// Maximum histogram bar length in glyphs.
const BAR_WIDTH: f64 = 20.0;

/// Render the full report. Sections with no data are omitted; the basic
/// time/user summary appears only when a stats snapshot is available.
pub fn render_report(state: &AggregateState, stats: Option<&PersistedStats>) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push('\n');
    out.push_str("📊 Live Room Data Analysis Report\n");
    out.push_str(RULE);
    out.push('\n');

    if let Some(stats) = stats {
        out.push_str(&format!("⏰ Start time: {}\n", stats.start_time));
        out.push_str(&format!("⏰ End time: {}\n", stats.end_time));
        out.push_str(&format!("👥 Unique users: {}\n", stats.unique_users_count));
    }
    out.push_str(&format!("💬 Total events: {}\n\n", state.total_messages));

    if state.total_messages > 0 {
        out.push_str("📈 Event type breakdown:\n");
        let mut counts: Vec<_> = state.type_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, &count) in counts {
            let percentage = count as f64 / state.total_messages as f64 * 100.0;
            out.push_str(&format!("  {}: {} ({:.1}%)\n", kind, count, percentage));
        }
        out.push('\n');
    }

    if !state.chat_counts.is_empty() {
        out.push_str(&format!("💬 Most active chatters (top {}):\n", TOP_N));
        for (user_id, count) in state.top_chatters(TOP_N) {
            out.push_str(&format!("  {}: {} messages\n", user_id, count));
        }
        out.push('\n');
    }

    if !state.gift_name_totals.is_empty() {
        out.push_str(&format!("🎁 Gift totals (top {}):\n", TOP_N));
        for (gift_name, count) in state.top_gift_names(TOP_N) {
            out.push_str(&format!("  {}: {}\n", gift_name, count));
        }
        out.push('\n');
    }

    if !state.gift_contribution.is_empty() {
        out.push_str(&format!("🎁 Top gift contributors (top {}):\n", TOP_N));
        for (user_id, count) in state.top_gifters(TOP_N) {
            out.push_str(&format!("  {}: {} gifts\n", user_id, count));
        }
        out.push('\n');
    }

    if !state.hourly_counts.is_empty() {
        out.push_str("⏰ Hourly event distribution:\n");
        let max_count = state.hourly_counts.values().copied().max().unwrap_or(0);
        for (hour, &count) in &state.hourly_counts {
            out.push_str(&format!(
                "  {:02}:00 {} {}\n",
                hour,
                bar(count, max_count),
                count
            ));
        }
        out.push('\n');
    }

    if !state.user_activity.is_empty() {
        let (active, total) = state.activity_counts();
        out.push_str(&format!(
            "👥 User activity: {}/{} users sent more than one event\n\n",
            active, total
        ));
    }

    out.push_str(RULE);
    out.push('\n');
    out
}

/// Proportional bar of `round(count / max_count * 20)` glyphs. A zero
/// maximum must short-circuit to an empty bar instead of dividing.
fn bar(count: u64, max_count: u64) -> String {
    if max_count == 0 {
        return String::new();
    }
    let length = (count as f64 / max_count as f64 * BAR_WIDTH).round() as usize;
    "█".repeat(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::aggregator::Aggregator;
    use crate::event::Event;
    use serde_json::json;

    const TS: &str = "2024-05-01T20:30:00.000000+08:00";

    #[test]
    fn test_type_breakdown_percentages() {
        let mut agg = Aggregator::new();
        for _ in 0..3 {
            agg.update(&Event::from_parts(
                TS.into(),
                "message",
                json!({"user_id": "a"}),
            ));
        }
        agg.update(&Event::from_parts(
            TS.into(),
            "gift",
            json!({"giver_id": "b", "gift_name": "玫瑰", "combo_count": 1}),
        ));

        let report = render_report(&agg.snapshot(), None);
        assert!(report.contains("message: 3 (75.0%)"), "{report}");
        assert!(report.contains("gift: 1 (25.0%)"), "{report}");
    }

    #[test]
    fn test_summary_header_requires_stats_snapshot() {
        let mut agg = Aggregator::new();
        agg.update(&Event::from_parts(TS.into(), "message", json!({"user_id": "a"})));
        let state = agg.snapshot();

        let without = render_report(&state, None);
        assert!(!without.contains("Start time"));

        let stats = PersistedStats {
            start_time: "2024-05-01T20:00:00+08:00".into(),
            end_time: "2024-05-01T21:00:00+08:00".into(),
            unique_users_count: 1,
            ..PersistedStats::default()
        };
        let with = render_report(&state, Some(&stats));
        assert!(with.contains("⏰ Start time: 2024-05-01T20:00:00+08:00"));
        assert!(with.contains("👥 Unique users: 1"));
    }

    #[test]
    fn test_all_zero_histogram_renders_zero_length_bars() {
        let mut state = AggregateState::default();
        state.hourly_counts.insert(9, 0);
        state.hourly_counts.insert(10, 0);

        let report = render_report(&state, None);
        assert!(report.contains("  09:00  0"), "{report}");
        assert!(report.contains("  10:00  0"), "{report}");
        assert!(!report.contains('█'));
    }

    #[test]
    fn test_bar_is_proportional_to_max() {
        assert_eq!(bar(0, 0), "");
        assert_eq!(bar(4, 4).chars().count(), 20);
        assert_eq!(bar(1, 4).chars().count(), 5);
        assert_eq!(bar(0, 4), "");
    }

    #[test]
    fn test_empty_state_renders_without_sections() {
        let report = render_report(&AggregateState::default(), None);
        assert!(report.contains("💬 Total events: 0"));
        assert!(!report.contains("Event type breakdown"));
        assert!(!report.contains("Most active chatters"));
    }

    #[test]
    fn test_top_sections_respect_first_seen_tie_break() {
        let mut agg = Aggregator::new();
        for user in ["A", "B", "A", "B", "C"] {
            agg.update(&Event::from_parts(TS.into(), "message", json!({ "user_id": user })));
        }
        let report = render_report(&agg.snapshot(), None);
        let a_pos = report.find("  A: 2 messages").unwrap();
        let b_pos = report.find("  B: 2 messages").unwrap();
        assert!(a_pos < b_pos);
    }
}
