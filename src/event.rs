//! Canonical event model and payload normalization.
//!
//! The transport client delivers `(event_type, attribute_map)` pairs; this
//! module turns them into immutable [`Event`] records with a capture-time
//! timestamp and a strongly-typed payload. The same normalization path is
//! used when rebuilding events from a persisted NDJSON log, so live and
//! offline processing agree on field defaults.

use chrono::{DateTime, Local, SecondsFormat, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminant of the six known event kinds plus the unknown fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    Gift,
    Like,
    Enter,
    Follow,
    RoomStats,
    Unknown,
}

impl EventKind {
    /// Stable wire name, used in persisted records and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Message => "message",
            EventKind::Gift => "gift",
            EventKind::Like => "like",
            EventKind::Enter => "enter",
            EventKind::Follow => "follow",
            EventKind::RoomStats => "room_stats",
            EventKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chat message attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user_level: String,
}

/// Gift attributes. `combo_count` is the number of gifts in the combo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GiftData {
    #[serde(default)]
    pub giver_id: String,
    #[serde(default)]
    pub giver_nickname: String,
    #[serde(default)]
    pub receiver_id: String,
    #[serde(default)]
    pub receiver_nickname: String,
    #[serde(default)]
    pub gift_name: String,
    #[serde(default)]
    pub combo_count: u64,
}

/// Like attributes: per-tap count and the room's running total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikeData {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub total: i64,
}

/// Room-entry attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnterData {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub member_count: i64,
}

/// Follow attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowData {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub follow_count: i64,
}

/// Room statistics snapshot attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomStatsData {
    #[serde(default)]
    pub display_short: String,
    #[serde(default)]
    pub display_middle: String,
    #[serde(default)]
    pub display_long: String,
    #[serde(default)]
    pub total: i64,
}

/// Tagged payload variant over the known event kinds.
///
/// Serialization is untagged on purpose: the wire record carries the kind in
/// its own `type` field (see [`Event::to_json_line`]), and deserialization
/// always goes through [`EventPayload::normalize`] so that missing or
/// malformed attributes fall back to defaults instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Message(MessageData),
    Gift(GiftData),
    Like(LikeData),
    Enter(EnterData),
    Follow(FollowData),
    RoomStats(RoomStatsData),
    /// Unrecognized event type; the raw payload is retained verbatim.
    Unknown(Value),
}

impl EventPayload {
    /// Build a payload from a raw event type and attribute map.
    ///
    /// Missing keys are substituted with type-appropriate defaults (empty
    /// string / zero) and numeric attributes delivered as JSON strings are
    /// coerced. This never fails: an unknown `raw_type` yields
    /// [`EventPayload::Unknown`] with the payload untouched.
    pub fn normalize(raw_type: &str, fields: Value) -> Self {
        match raw_type {
            "message" => EventPayload::Message(MessageData {
                user_id: str_field(&fields, "user_id"),
                nickname: str_field(&fields, "nickname"),
                content: str_field(&fields, "content"),
                user_level: str_field(&fields, "user_level"),
            }),
            "gift" => EventPayload::Gift(GiftData {
                giver_id: str_field(&fields, "giver_id"),
                giver_nickname: str_field(&fields, "giver_nickname"),
                receiver_id: str_field(&fields, "receiver_id"),
                receiver_nickname: str_field(&fields, "receiver_nickname"),
                gift_name: str_field(&fields, "gift_name"),
                combo_count: uint_field(&fields, "combo_count"),
            }),
            "like" => EventPayload::Like(LikeData {
                user_id: str_field(&fields, "user_id"),
                nickname: str_field(&fields, "nickname"),
                count: int_field(&fields, "count"),
                total: int_field(&fields, "total"),
            }),
            "enter" => EventPayload::Enter(EnterData {
                user_id: str_field(&fields, "user_id"),
                nickname: str_field(&fields, "nickname"),
                member_count: int_field(&fields, "member_count"),
            }),
            "follow" => EventPayload::Follow(FollowData {
                user_id: str_field(&fields, "user_id"),
                nickname: str_field(&fields, "nickname"),
                follow_count: int_field(&fields, "follow_count"),
            }),
            "room_stats" => EventPayload::RoomStats(RoomStatsData {
                display_short: str_field(&fields, "display_short"),
                display_middle: str_field(&fields, "display_middle"),
                display_long: str_field(&fields, "display_long"),
                total: int_field(&fields, "total"),
            }),
            _ => EventPayload::Unknown(fields),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Message(_) => EventKind::Message,
            EventPayload::Gift(_) => EventKind::Gift,
            EventPayload::Like(_) => EventKind::Like,
            EventPayload::Enter(_) => EventKind::Enter,
            EventPayload::Follow(_) => EventKind::Follow,
            EventPayload::RoomStats(_) => EventKind::RoomStats,
            EventPayload::Unknown(_) => EventKind::Unknown,
        }
    }
}

/// One normalized, immutable occurrence from the live broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// RFC 3339 timestamp with local offset, assigned at capture time.
    /// Upstream clocks are never trusted.
    pub timestamp: String,
    pub payload: EventPayload,
}

/// Wire shape of one persisted NDJSON record.
#[derive(Serialize)]
struct RecordOut<'a> {
    timestamp: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    data: &'a EventPayload,
}

#[derive(Deserialize)]
struct RecordIn {
    #[serde(default)]
    timestamp: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl Event {
    /// Normalize a raw transport payload, stamping it with the capture clock.
    pub fn capture(raw_type: &str, fields: Value) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            payload: EventPayload::normalize(raw_type, fields),
        }
    }

    /// Rebuild an event from an explicit timestamp and raw parts (offline
    /// path; same normalization as the live path).
    pub fn from_parts(timestamp: String, raw_type: &str, fields: Value) -> Self {
        Self {
            timestamp,
            payload: EventPayload::normalize(raw_type, fields),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Serialize to one self-contained NDJSON record (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&RecordOut {
            timestamp: &self.timestamp,
            kind: self.kind().as_str(),
            data: &self.payload,
        })
    }

    /// Decode one NDJSON record. Structural JSON errors bubble up (the
    /// caller skips and counts them); attribute-level problems are handled
    /// by normalization and never fail.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        let record: RecordIn = serde_json::from_str(line)?;
        Ok(Self::from_parts(record.timestamp, &record.kind, record.data))
    }

    /// Hour of day (0-23) from the event timestamp, in its captured offset.
    /// `None` when the timestamp does not parse; such events are excluded
    /// from time-bucketed aggregates only.
    pub fn hour(&self) -> Option<u32> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.hour())
    }
}

fn str_field(fields: &Value, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn int_field(fields: &Value, key: &str) -> i64 {
    match fields.get(key) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn uint_field(fields: &Value, key: &str) -> u64 {
    match fields.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_message_with_missing_fields() {
        let payload = EventPayload::normalize("message", json!({"nickname": "小明"}));
        match payload {
            EventPayload::Message(data) => {
                assert_eq!(data.nickname, "小明");
                assert_eq!(data.user_id, "");
                assert_eq!(data.content, "");
                assert_eq!(data.user_level, "");
            }
            other => panic!("expected message payload, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_gift_coerces_string_combo() {
        let payload = EventPayload::normalize(
            "gift",
            json!({"giver_id": "u1", "gift_name": "玫瑰", "combo_count": "3"}),
        );
        match payload {
            EventPayload::Gift(data) => {
                assert_eq!(data.combo_count, 3);
                assert_eq!(data.gift_name, "玫瑰");
                assert_eq!(data.receiver_id, "");
            }
            other => panic!("expected gift payload, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_gift_without_combo_defaults_to_zero() {
        let payload = EventPayload::normalize("gift", json!({"giver_id": "u1"}));
        match payload {
            EventPayload::Gift(data) => assert_eq!(data.combo_count, 0),
            other => panic!("expected gift payload, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_unknown_type_keeps_payload_verbatim() {
        let raw = json!({"foo": 1, "bar": {"baz": true}});
        let payload = EventPayload::normalize("fancy_new_thing", raw.clone());
        assert_eq!(payload.kind(), EventKind::Unknown);
        assert_eq!(payload, EventPayload::Unknown(raw));
    }

    #[test]
    fn test_capture_assigns_parseable_timestamp() {
        let event = Event::capture("like", json!({"user_id": "u2", "count": 5}));
        assert_eq!(event.kind(), EventKind::Like);
        assert!(event.hour().is_some());
    }

    #[test]
    fn test_json_line_round_trip() {
        let event = Event::from_parts(
            "2024-05-01T21:13:05.123456+08:00".to_string(),
            "follow",
            json!({"user_id": "u3", "nickname": "粉丝", "follow_count": 42}),
        );
        let line = event.to_json_line().unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["type"], "follow");
        assert_eq!(parsed["data"]["follow_count"], 42);

        let restored = Event::from_json_line(&line).unwrap();
        assert_eq!(restored, event);
        assert_eq!(restored.hour(), Some(21));
    }

    #[test]
    fn test_from_json_line_tolerates_missing_type_and_timestamp() {
        let event = Event::from_json_line(r#"{"data": {"x": 1}}"#).unwrap();
        assert_eq!(event.kind(), EventKind::Unknown);
        assert_eq!(event.timestamp, "");
        assert_eq!(event.hour(), None);
    }

    #[test]
    fn test_from_json_line_rejects_malformed_json() {
        assert!(Event::from_json_line("{not json").is_err());
    }
}
