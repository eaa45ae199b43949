//! Replay loaded events through a fresh aggregator.

use crate::analytics::aggregator::{AggregateState, Aggregator};
use crate::event::Event;

/// Rebuild an [`AggregateState`] by feeding every event, in loaded order,
/// through the same aggregation logic used live. For a single-file log the
/// result matches the live run exactly; with multiple interleaving files
/// only the gift timeline ordering can differ.
pub fn replay<'a, I>(events: I) -> AggregateState
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut aggregator = Aggregator::new();
    for event in events {
        aggregator.update(event);
    }
    aggregator.into_state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replay_equals_incremental_aggregation() {
        let ts = "2024-05-01T20:00:00.000000+08:00";
        let events: Vec<Event> = vec![
            Event::from_parts(ts.into(), "message", json!({"user_id": "a", "content": "hi"})),
            Event::from_parts(
                ts.into(),
                "gift",
                json!({"giver_id": "b", "gift_name": "小心心", "combo_count": 5}),
            ),
            Event::from_parts(ts.into(), "like", json!({"user_id": "a", "count": 3})),
        ];

        let mut live = Aggregator::new();
        for event in &events {
            live.update(event);
        }
        let live_state = live.into_state();
        let replayed = replay(&events);

        assert_eq!(replayed.total_messages, live_state.total_messages);
        assert_eq!(replayed.type_counts, live_state.type_counts);
        assert_eq!(replayed.unique_users, live_state.unique_users);
        assert_eq!(replayed.gift_name_totals, live_state.gift_name_totals);
        assert_eq!(replayed.hourly_counts, live_state.hourly_counts);
        assert_eq!(replayed.gift_timeline, live_state.gift_timeline);
    }
}
