//! 受信イベントの逐次集計
//!
//! ライブ取り込みとオフライン再生の両方が同じ [`Aggregator`] を通るため、
//! 永続化ログから再計算した統計はライブ集計と一致する。

use crate::event::{Event, EventKind, EventPayload};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};

/// ギフトタイムラインの1エントリ（挿入順を保持、上限なし）
#[derive(Debug, Clone, PartialEq)]
pub struct GiftTimelineEntry {
    pub timestamp: String,
    pub gift_name: String,
    pub giver_id: String,
    pub combo_count: u64,
}

/// 1回の実行で蓄積される統計集合
///
/// 所有者は [`Aggregator`] のみ。更新は `update` 経由に限られ、
/// ロールバックや実行間のマージは行わない。カウント用のマップは
/// 初出順を保持する `IndexMap` なので、同率の top-K は常に
/// 初出順で安定して並ぶ。
#[derive(Debug, Clone, Default)]
pub struct AggregateState {
    /// 最初のイベントのタイムスタンプ
    pub start_time: Option<String>,
    /// 最後の flush / close 時刻
    pub end_time: Option<String>,
    /// 消費した全イベント数
    pub total_messages: u64,
    /// イベント種別ごとの件数
    pub type_counts: IndexMap<EventKind, u64>,
    /// 観測したユーザー/ギフト送信者の識別子集合
    pub unique_users: HashSet<String>,
    /// user_id ごとのイベント数（message / like / enter / follow）
    pub user_activity: IndexMap<String, u64>,
    /// user_id ごとのチャット数
    pub chat_counts: IndexMap<String, u64>,
    /// giver_id ごとのギフト貢献（combo_count の合計）
    pub gift_contribution: IndexMap<String, u64>,
    /// ギフト名ごとの combo_count 合計
    pub gift_name_totals: IndexMap<String, u64>,
    /// 時間帯 (0-23) ごとのイベント数
    pub hourly_counts: BTreeMap<u32, u64>,
    /// 全ギフトイベントの時系列（到着順）
    pub gift_timeline: Vec<GiftTimelineEntry>,
}

impl AggregateState {
    pub fn top_chatters(&self, k: usize) -> Vec<(&str, u64)> {
        top_k(&self.chat_counts, k)
    }

    pub fn top_gifters(&self, k: usize) -> Vec<(&str, u64)> {
        top_k(&self.gift_contribution, k)
    }

    pub fn top_gift_names(&self, k: usize) -> Vec<(&str, u64)> {
        top_k(&self.gift_name_totals, k)
    }

    /// (複数イベントを出したユーザー数, ユーザー総数)
    pub fn activity_counts(&self) -> (usize, usize) {
        let active = self.user_activity.values().filter(|&&c| c > 1).count();
        (active, self.user_activity.len())
    }
}

/// カウント降順の上位 k 件。同率は初出順（安定ソート）。
pub fn top_k(map: &IndexMap<String, u64>, k: usize) -> Vec<(&str, u64)> {
    let mut entries: Vec<(&str, u64)> = map.iter().map(|(id, &n)| (id.as_str(), n)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(k);
    entries
}

/// イベントを1件ずつ消費して [`AggregateState`] を更新する
///
/// `update` は O(1) 償却。top-K はここでは維持せず、レポート生成時に
/// 全量マップから切り出す（取り込みの単純さをメモリと引き換えにする設計）。
#[derive(Debug, Default)]
pub struct Aggregator {
    state: AggregateState,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1イベント分の統計更新。戻り値なし、副作用のみ。
    pub fn update(&mut self, event: &Event) {
        let state = &mut self.state;

        if state.start_time.is_none() {
            state.start_time = Some(event.timestamp.clone());
        }

        state.total_messages += 1;
        *state.type_counts.entry(event.kind()).or_insert(0) += 1;

        // タイムスタンプが解釈できないイベントは時間帯集計からのみ除外
        if let Some(hour) = event.hour() {
            *state.hourly_counts.entry(hour).or_insert(0) += 1;
        }

        match &event.payload {
            EventPayload::Message(data) => {
                if !data.user_id.is_empty() {
                    state.unique_users.insert(data.user_id.clone());
                    *state.user_activity.entry(data.user_id.clone()).or_insert(0) += 1;
                    *state.chat_counts.entry(data.user_id.clone()).or_insert(0) += 1;
                }
            }
            EventPayload::Gift(data) => {
                if !data.giver_id.is_empty() {
                    state.unique_users.insert(data.giver_id.clone());
                    *state
                        .gift_contribution
                        .entry(data.giver_id.clone())
                        .or_insert(0) += data.combo_count;
                }
                if !data.gift_name.is_empty() {
                    *state
                        .gift_name_totals
                        .entry(data.gift_name.clone())
                        .or_insert(0) += data.combo_count;
                }
                state.gift_timeline.push(GiftTimelineEntry {
                    timestamp: event.timestamp.clone(),
                    gift_name: data.gift_name.clone(),
                    giver_id: data.giver_id.clone(),
                    combo_count: data.combo_count,
                });
            }
            EventPayload::Like(data) => self.track_user(&data.user_id),
            EventPayload::Enter(data) => self.track_user(&data.user_id),
            EventPayload::Follow(data) => self.track_user(&data.user_id),
            EventPayload::RoomStats(_) | EventPayload::Unknown(_) => {}
        }
    }

    fn track_user(&mut self, user_id: &str) {
        if !user_id.is_empty() {
            self.state.unique_users.insert(user_id.to_string());
            *self
                .state
                .user_activity
                .entry(user_id.to_string())
                .or_insert(0) += 1;
        }
    }

    /// close / flush 時刻を記録する
    pub fn finish(&mut self, end_time: String) {
        self.state.end_time = Some(end_time);
    }

    /// 読み取り専用スナップショット（コピー）。呼び出し側はこのコピーを
    /// 変更してはならず、続きの更新は `update` を通す。
    pub fn snapshot(&self) -> AggregateState {
        self.state.clone()
    }

    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    pub fn into_state(self) -> AggregateState {
        self.state
    }
}
