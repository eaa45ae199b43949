//! 開発用の擬似イベントソース
//!
//! 実際のライブ配信プロトコルクライアントを接続せずにパイプライン全体を
//! 動かすための、乱数駆動のイベント生成器。到着間隔と種別の偏りは
//! 実配信のトラフィックを雑に模している。

use super::{EventSource, RawEvent};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::time::Duration;

const NICKNAMES: [&str; 8] = [
    "星河漫游", "小鱼干", "夜色温柔", "一颗柠檬", "山茶花开", "北巷南猫", "清风徐来", "丸子头",
];

const GIFT_NAMES: [&str; 6] = ["小心心", "玫瑰", "棒棒糖", "甜甜圈", "跑车", "火箭"];

/// 乱数駆動の [`EventSource`] 実装
#[derive(Debug)]
pub struct SimulatedSource {
    room_id: String,
    rng: StdRng,
    mean_delay_ms: u64,
    like_total: i64,
    member_count: i64,
    emitted: u64,
    limit: Option<u64>,
}

impl SimulatedSource {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            rng: StdRng::from_entropy(),
            mean_delay_ms: 400,
            like_total: 0,
            member_count: 150,
            emitted: 0,
            limit: None,
        }
    }

    /// 平均到着間隔（ミリ秒）を変更する
    pub fn with_mean_delay_ms(mut self, mean_delay_ms: u64) -> Self {
        self.mean_delay_ms = mean_delay_ms;
        self
    }

    /// n 件でストリームを終了させる（テスト用）
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn user(&mut self) -> (String, String) {
        let idx = self.rng.gen_range(0..NICKNAMES.len());
        (format!("sim_user_{:02}", idx), NICKNAMES[idx].to_string())
    }

    fn generate(&mut self) -> RawEvent {
        let roll = self.rng.gen_range(0..100);
        let (user_id, nickname) = self.user();

        if roll < 45 {
            let content = *[
                "主播好！",
                "来了来了",
                "这也太好笑了吧",
                "关注了",
                "666",
                "下一首唱什么？",
            ]
            .choose(&mut self.rng)
            .unwrap();
            let user_level: i64 = self.rng.gen_range(1..50);
            RawEvent::new(
                "message",
                json!({
                    "user_id": user_id,
                    "nickname": nickname,
                    "content": content,
                    "user_level": user_level.to_string(),
                }),
            )
        } else if roll < 65 {
            let count = self.rng.gen_range(1..=15);
            self.like_total += count;
            RawEvent::new(
                "like",
                json!({
                    "user_id": user_id,
                    "nickname": nickname,
                    "count": count,
                    "total": self.like_total,
                }),
            )
        } else if roll < 80 {
            self.member_count += self.rng.gen_range(-2..5);
            RawEvent::new(
                "enter",
                json!({
                    "user_id": user_id,
                    "nickname": nickname,
                    "member_count": self.member_count.max(0),
                }),
            )
        } else if roll < 90 {
            let gift_name = *GIFT_NAMES.choose(&mut self.rng).unwrap();
            let combo_count: u64 = self.rng.gen_range(1..=10);
            RawEvent::new(
                "gift",
                json!({
                    "giver_id": user_id,
                    "giver_nickname": nickname,
                    "receiver_id": format!("room_{}", self.room_id),
                    "receiver_nickname": "主播",
                    "gift_name": gift_name,
                    "combo_count": combo_count,
                }),
            )
        } else if roll < 95 {
            let follow_count: i64 = self.rng.gen_range(100..100_000);
            RawEvent::new(
                "follow",
                json!({
                    "user_id": user_id,
                    "nickname": nickname,
                    "follow_count": follow_count,
                }),
            )
        } else {
            let online = self.member_count.max(0);
            RawEvent::new(
                "room_stats",
                json!({
                    "display_short": format!("{}", online),
                    "display_middle": format!("{}人", online),
                    "display_long": format!("{}人在线观看", online),
                    "total": online,
                }),
            )
        }
    }
}

#[async_trait]
impl EventSource for SimulatedSource {
    async fn next_event(&mut self) -> anyhow::Result<Option<RawEvent>> {
        if let Some(limit) = self.limit {
            if self.emitted >= limit {
                return Ok(None);
            }
        }

        if self.mean_delay_ms > 0 {
            let jitter = self.rng.gen_range(0..=self.mean_delay_ms);
            tokio::time::sleep(Duration::from_millis(self.mean_delay_ms / 2 + jitter)).await;
        }

        self.emitted += 1;
        Ok(Some(self.generate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[tokio::test]
    async fn test_limit_ends_the_stream() {
        let mut source = SimulatedSource::new("12345")
            .with_mean_delay_ms(0)
            .with_limit(5);

        let mut seen = 0;
        while let Some(_raw) = source.next_event().await.unwrap() {
            seen += 1;
        }
        assert_eq!(seen, 5);
    }

    #[tokio::test]
    async fn test_generated_events_normalize_to_known_kinds() {
        let mut source = SimulatedSource::new("12345")
            .with_mean_delay_ms(0)
            .with_limit(200);

        while let Some(raw) = source.next_event().await.unwrap() {
            let event = Event::capture(&raw.kind, raw.fields);
            assert_ne!(
                event.kind().as_str(),
                "unknown",
                "simulator produced an unclassifiable event: {}",
                raw.kind
            );
        }
    }
}
