//! Fixed-width tabular projection of events.
//!
//! Every tabular target (buffered CSV / XLSX batches) shares one stable
//! 20-column superset schema regardless of event type. The flattening is
//! generated from the payload variant in one place; sinks never duplicate
//! per-type column lists.

use crate::event::{Event, EventPayload};
use serde_json::json;

/// Column order of the tabular superset schema. Fixed across writes.
pub const COLUMNS: [&str; 20] = [
    "timestamp",
    "message_type",
    "user_id",
    "nickname",
    "content",
    "user_level",
    "giver_id",
    "giver_nickname",
    "gift_name",
    "combo_count",
    "receiver_id",
    "receiver_nickname",
    "like_count",
    "like_total",
    "member_count",
    "follow_count",
    "display_short",
    "display_middle",
    "display_long",
    "room_total",
];

/// One event flattened to the superset schema. Columns that do not apply to
/// the event's type are empty strings, never null-typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRow {
    pub timestamp: String,
    pub message_type: String,
    pub user_id: String,
    pub nickname: String,
    pub content: String,
    pub user_level: String,
    pub giver_id: String,
    pub giver_nickname: String,
    pub gift_name: String,
    pub combo_count: String,
    pub receiver_id: String,
    pub receiver_nickname: String,
    pub like_count: String,
    pub like_total: String,
    pub member_count: String,
    pub follow_count: String,
    pub display_short: String,
    pub display_middle: String,
    pub display_long: String,
    pub room_total: String,
}

impl EventRow {
    pub fn from_event(event: &Event) -> Self {
        let mut row = EventRow {
            timestamp: event.timestamp.clone(),
            message_type: event.kind().as_str().to_string(),
            ..EventRow::default()
        };

        match &event.payload {
            EventPayload::Message(data) => {
                row.user_id = data.user_id.clone();
                row.nickname = data.nickname.clone();
                row.content = data.content.clone();
                row.user_level = data.user_level.clone();
            }
            EventPayload::Gift(data) => {
                row.giver_id = data.giver_id.clone();
                row.giver_nickname = data.giver_nickname.clone();
                row.gift_name = data.gift_name.clone();
                row.combo_count = data.combo_count.to_string();
                row.receiver_id = data.receiver_id.clone();
                row.receiver_nickname = data.receiver_nickname.clone();
            }
            EventPayload::Like(data) => {
                row.user_id = data.user_id.clone();
                row.nickname = data.nickname.clone();
                row.like_count = data.count.to_string();
                row.like_total = data.total.to_string();
            }
            EventPayload::Enter(data) => {
                row.user_id = data.user_id.clone();
                row.nickname = data.nickname.clone();
                row.member_count = data.member_count.to_string();
            }
            EventPayload::Follow(data) => {
                row.user_id = data.user_id.clone();
                row.nickname = data.nickname.clone();
                row.follow_count = data.follow_count.to_string();
            }
            EventPayload::RoomStats(data) => {
                row.display_short = data.display_short.clone();
                row.display_middle = data.display_middle.clone();
                row.display_long = data.display_long.clone();
                row.room_total = data.total.to_string();
            }
            EventPayload::Unknown(_) => {}
        }

        row
    }

    /// Rebuild an event from the tabular schema. Goes back through the
    /// normalizer, so numeric cells are coerced with the same rules as the
    /// live path.
    pub fn into_event(self) -> Event {
        let fields = match self.message_type.as_str() {
            "message" => json!({
                "user_id": self.user_id,
                "nickname": self.nickname,
                "content": self.content,
                "user_level": self.user_level,
            }),
            "gift" => json!({
                "giver_id": self.giver_id,
                "giver_nickname": self.giver_nickname,
                "receiver_id": self.receiver_id,
                "receiver_nickname": self.receiver_nickname,
                "gift_name": self.gift_name,
                "combo_count": self.combo_count,
            }),
            "like" => json!({
                "user_id": self.user_id,
                "nickname": self.nickname,
                "count": self.like_count,
                "total": self.like_total,
            }),
            "enter" => json!({
                "user_id": self.user_id,
                "nickname": self.nickname,
                "member_count": self.member_count,
            }),
            "follow" => json!({
                "user_id": self.user_id,
                "nickname": self.nickname,
                "follow_count": self.follow_count,
            }),
            "room_stats" => json!({
                "display_short": self.display_short,
                "display_middle": self.display_middle,
                "display_long": self.display_long,
                "total": self.room_total,
            }),
            _ => json!({}),
        };

        Event::from_parts(self.timestamp, &self.message_type, fields)
    }

    /// Cell values in [`COLUMNS`] order.
    pub fn values(&self) -> [&str; 20] {
        [
            &self.timestamp,
            &self.message_type,
            &self.user_id,
            &self.nickname,
            &self.content,
            &self.user_level,
            &self.giver_id,
            &self.giver_nickname,
            &self.gift_name,
            &self.combo_count,
            &self.receiver_id,
            &self.receiver_nickname,
            &self.like_count,
            &self.like_total,
            &self.member_count,
            &self.follow_count,
            &self.display_short,
            &self.display_middle,
            &self.display_long,
            &self.room_total,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TS: &str = "2024-05-01T19:30:00.000000+08:00";

    fn event(raw_type: &str, fields: serde_json::Value) -> Event {
        Event::from_parts(TS.to_string(), raw_type, fields)
    }

    #[test]
    fn test_column_count_is_stable() {
        let row = EventRow::from_event(&event("message", json!({"user_id": "u"})));
        assert_eq!(row.values().len(), COLUMNS.len());
    }

    #[test]
    fn test_message_projection_leaves_other_columns_empty() {
        let row = EventRow::from_event(&event(
            "message",
            json!({"user_id": "u1", "nickname": "观众", "content": "hi", "user_level": "12"}),
        ));
        assert_eq!(row.message_type, "message");
        assert_eq!(row.content, "hi");
        assert_eq!(row.gift_name, "");
        assert_eq!(row.member_count, "");
        assert_eq!(row.room_total, "");
    }

    #[test]
    fn test_round_trip_preserves_each_known_kind() {
        let originals = vec![
            event(
                "message",
                json!({"user_id": "u1", "nickname": "甲", "content": "大家好", "user_level": "3"}),
            ),
            event(
                "gift",
                json!({
                    "giver_id": "g1", "giver_nickname": "乙", "receiver_id": "host",
                    "receiver_nickname": "主播", "gift_name": "跑车", "combo_count": 2
                }),
            ),
            event(
                "like",
                json!({"user_id": "u2", "nickname": "丙", "count": 7, "total": 99}),
            ),
            event(
                "enter",
                json!({"user_id": "u3", "nickname": "丁", "member_count": 512}),
            ),
            event(
                "follow",
                json!({"user_id": "u4", "nickname": "戊", "follow_count": 1024}),
            ),
            event(
                "room_stats",
                json!({
                    "display_short": "1.2w", "display_middle": "12000",
                    "display_long": "12000人在线", "total": 12000
                }),
            ),
        ];

        for original in originals {
            let restored = EventRow::from_event(&original).into_event();
            assert_eq!(restored, original, "round trip for {}", original.kind());
        }
    }
}
