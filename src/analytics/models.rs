//! Data models for guild analytics

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date range of a stats request, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Upper edge check; the lower edge is enforced by the message source
    pub fn admits(&self, at: DateTime<Utc>) -> bool {
        at <= self.end
    }
}

/// RFC 3339 timestamp, or a plain `YYYY-MM-DD` date meaning local midnight
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(local_midnight)
}

/// Start of `day` in the local zone; the earlier instant when midnight is ambiguous
pub fn local_midnight(day: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

/// Content category of a single message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Video,
    File,
    Voice,
}

impl MessageKind {
    /// Category for an attachment's declared content type
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("image/") => MessageKind::Image,
            Some(ct) if ct.starts_with("video/") => MessageKind::Video,
            _ => MessageKind::File,
        }
    }
}

/// The five fixed message categories, always serialized
///
/// Keys are the labels the dashboard charts by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTypeCounts {
    #[serde(rename = "Текст")]
    pub text: u64,
    #[serde(rename = "Изображения")]
    pub image: u64,
    #[serde(rename = "Видео")]
    pub video: u64,
    #[serde(rename = "Файлы")]
    pub file: u64,
    #[serde(rename = "Голосовые")]
    pub voice: u64,
}

impl MessageTypeCounts {
    pub fn increment(&mut self, kind: MessageKind) {
        *self.slot(kind) += 1;
    }

    pub fn total(&self) -> u64 {
        self.text + self.image + self.video + self.file + self.voice
    }

    fn merge(&mut self, other: &MessageTypeCounts) {
        self.text += other.text;
        self.image += other.image;
        self.video += other.video;
        self.file += other.file;
        self.voice += other.voice;
    }

    fn slot(&mut self, kind: MessageKind) -> &mut u64 {
        match kind {
            MessageKind::Text => &mut self.text,
            MessageKind::Image => &mut self.image,
            MessageKind::Video => &mut self.video,
            MessageKind::File => &mut self.file,
            MessageKind::Voice => &mut self.voice,
        }
    }
}

/// Analytics result for one guild and one date range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub messages_per_day: BTreeMap<String, u64>,
    pub top_active_users: BTreeMap<String, u64>,
    pub activity_by_hour: BTreeMap<u32, u64>,
    pub member_growth: BTreeMap<String, u64>,
    pub active_channels: BTreeMap<String, u64>,
    pub roles_distribution: BTreeMap<String, u64>,
    pub message_types: MessageTypeCounts,
    pub server_name: String,
}

impl StatsSnapshot {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Self::default()
        }
    }

    /// Fold one channel's partial result into the snapshot
    pub fn absorb(&mut self, tally: ChannelTally) {
        for (day, count) in tally.messages_per_day {
            *self.messages_per_day.entry(day).or_insert(0) += count;
        }
        for (user, count) in tally.users {
            *self.top_active_users.entry(user).or_insert(0) += count;
        }
        for (hour, count) in tally.hours {
            *self.activity_by_hour.entry(hour).or_insert(0) += count;
        }
        if tally.messages > 0 {
            *self.active_channels.entry(tally.channel_name).or_insert(0) += tally.messages;
        }
        self.message_types.merge(&tally.message_types);
    }

    pub fn record_join(&mut self, day: NaiveDate) {
        *self.member_growth.entry(day_key(day)).or_insert(0) += 1;
    }

    /// Total messages counted across all days
    pub fn total_messages(&self) -> u64 {
        self.messages_per_day.values().sum()
    }
}

/// Partial counts produced by a single channel fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelTally {
    pub channel_name: String,
    pub messages: u64,
    pub messages_per_day: BTreeMap<String, u64>,
    pub users: BTreeMap<String, u64>,
    pub hours: BTreeMap<u32, u64>,
    pub message_types: MessageTypeCounts,
}

impl ChannelTally {
    pub fn new(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, day: NaiveDate, hour: u32, username: &str, kind: Option<MessageKind>) {
        self.messages += 1;
        *self.messages_per_day.entry(day_key(day)).or_insert(0) += 1;
        *self.users.entry(username.to_string()).or_insert(0) += 1;
        *self.hours.entry(hour).or_insert(0) += 1;
        if let Some(kind) = kind {
            self.message_types.increment(kind);
        }
    }
}

/// Canonical `YYYY-MM-DD` key
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn message_types_always_serialize_five_keys() {
        let snapshot = StatsSnapshot::new("empty");
        let json = serde_json::to_value(&snapshot).unwrap();

        let types = json["messageTypes"].as_object().unwrap();
        assert_eq!(types.len(), 5);
        for key in ["Текст", "Изображения", "Видео", "Файлы", "Голосовые"] {
            assert_eq!(types[key], Value::from(0));
        }
        assert_eq!(json["serverName"], "empty");
        assert!(json["activityByHour"].as_object().unwrap().is_empty());
    }

    #[test]
    fn content_type_classification() {
        assert_eq!(MessageKind::from_content_type(Some("image/png")), MessageKind::Image);
        assert_eq!(MessageKind::from_content_type(Some("video/mp4")), MessageKind::Video);
        assert_eq!(
            MessageKind::from_content_type(Some("application/pdf")),
            MessageKind::File
        );
        assert_eq!(MessageKind::from_content_type(None), MessageKind::File);
    }

    #[test]
    fn absorb_merges_overlapping_keys() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut first = ChannelTally::new("general");
        first.record(day, 9, "alice", Some(MessageKind::Text));
        let mut second = ChannelTally::new("random");
        second.record(day, 9, "alice", Some(MessageKind::Image));
        second.record(day, 10, "bob", None);

        let mut snapshot = StatsSnapshot::new("guild");
        snapshot.absorb(first);
        snapshot.absorb(second);

        assert_eq!(snapshot.messages_per_day["2024-05-01"], 3);
        assert_eq!(snapshot.top_active_users["alice"], 2);
        assert_eq!(snapshot.activity_by_hour[&9], 2);
        assert_eq!(snapshot.active_channels["random"], 2);
        assert_eq!(snapshot.message_types.total(), 2);
    }

    #[test]
    fn parse_date_accepts_timestamps_and_plain_days() {
        assert_eq!(
            parse_date("2024-03-01T10:30:00.000Z").unwrap().to_rfc3339(),
            "2024-03-01T10:30:00+00:00"
        );

        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let start = parse_date(" 2024-03-01 ").unwrap();
        assert_eq!(start, local_midnight(day).unwrap());
        assert_eq!(start.with_timezone(&Local).date_naive(), day);

        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2024-02-30").is_none());
    }

    #[test]
    fn window_rejects_inverted_range() {
        let now = Utc::now();
        assert!(TimeWindow::new(now, now).is_some());
        assert!(TimeWindow::new(now, now - chrono::Duration::seconds(1)).is_none());
    }
}
