//! Data models for DJ radio listing pages
//!
//! [`Program`] is one row of the listing table. [`ChannelInfo`] mirrors the
//! JSON document embedded in the first page (`<textarea id="radio-data">`).

use crate::error::{Error, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

// ============================================================================
// Programs
// ============================================================================

/// One published episode of a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Episode ordinal as published
    pub index: u32,
    /// Episode title
    pub title: String,
    /// Number of plays
    pub play_count: u64,
    /// Number of likes
    pub like_count: u64,
    /// Publication date
    pub publish_date: NaiveDate,
    /// Episode length
    pub duration: Duration,
}

impl Program {
    /// Episode length in whole seconds
    pub fn duration_secs(&self) -> u64 {
        self.duration.as_secs()
    }
}

// ============================================================================
// Channel metadata
// ============================================================================

/// Channel-level facts from the embedded metadata block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    /// Channel identifier
    #[serde(deserialize_with = "lenient_u64")]
    pub id: u64,
    /// Display name
    pub name: String,
    /// Host profile
    #[serde(default)]
    pub dj: Host,
    /// Category label
    #[serde(default)]
    pub category: String,
    /// Creation time (epoch milliseconds)
    pub create_time: i64,
    /// Number of subscribers
    #[serde(deserialize_with = "lenient_u64")]
    pub sub_count: u64,
    /// Declared number of programs
    #[serde(deserialize_with = "lenient_u64")]
    pub program_count: u64,
    /// Publication time of the latest program (epoch milliseconds)
    pub last_program_create_time: i64,
    /// Number of shares
    #[serde(default, deserialize_with = "lenient_u64")]
    pub share_count: u64,
    /// Recommendation blurb
    #[serde(default)]
    pub rcmd_text: Option<String>,
}

/// Channel host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    /// Public nickname
    #[serde(default)]
    pub nickname: String,
}

impl ChannelInfo {
    /// Host nickname
    pub fn host_name(&self) -> &str {
        &self.dj.nickname
    }

    /// Recommendation text, if a non-blank one is set
    pub fn recommendation(&self) -> Option<&str> {
        self.rcmd_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Creation time in the local timezone
    pub fn created_at(&self) -> Result<NaiveDateTime> {
        local_datetime(self.create_time)
    }

    /// Publication time of the latest program in the local timezone
    pub fn last_program_at(&self) -> Result<NaiveDateTime> {
        local_datetime(self.last_program_create_time)
    }
}

// ============================================================================
// Full listing
// ============================================================================

/// A channel with its complete program listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Metadata read from the first page
    pub info: ChannelInfo,
    /// Programs in page arrival order (oldest first)
    pub programs: Vec<Program>,
}

/// Converts an epoch-millisecond timestamp to a local date-time
pub fn local_datetime(millis: i64) -> Result<NaiveDateTime> {
    Local
        .timestamp_millis_opt(millis)
        .earliest()
        .map(|dt| dt.naive_local())
        .ok_or_else(|| Error::parse(format!("invalid timestamp: {}", millis)))
}

/// Counts are sometimes serialized as strings
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_info_from_json() {
        let info: ChannelInfo = serde_json::from_value(json!({
            "id": 336355127,
            "name": "A Radio",
            "dj": { "nickname": "Host", "userId": 1 },
            "category": "Music",
            "createTime": 1_500_000_000_000i64,
            "subCount": "1024",
            "programCount": 1200,
            "lastProgramCreateTime": 1_600_000_000_000i64,
            "shareCount": 7,
            "rcmdText": null
        }))
        .unwrap();

        assert_eq!(info.id, 336355127);
        assert_eq!(info.host_name(), "Host");
        assert_eq!(info.sub_count, 1024);
        assert_eq!(info.program_count, 1200);
        assert_eq!(info.recommendation(), None);
    }

    #[test]
    fn test_recommendation_ignores_blank() {
        let mut info: ChannelInfo = serde_json::from_value(json!({
            "id": "1",
            "name": "n",
            "createTime": 0,
            "subCount": 1,
            "programCount": 1,
            "lastProgramCreateTime": 0,
            "rcmdText": "  "
        }))
        .unwrap();
        assert_eq!(info.recommendation(), None);
        assert_eq!(info.share_count, 0);

        info.rcmd_text = Some("Worth a listen".to_string());
        assert_eq!(info.recommendation(), Some("Worth a listen"));
    }

    #[test]
    fn test_local_datetime_roundtrip() {
        let dt = local_datetime(1_600_000_000_000).unwrap();
        let back = Local.from_local_datetime(&dt).earliest().unwrap();
        assert_eq!(back.timestamp_millis(), 1_600_000_000_000);
    }

    #[test]
    fn test_program_duration_secs() {
        let program = Program {
            index: 1,
            title: "t".to_string(),
            play_count: 0,
            like_count: 0,
            publish_date: NaiveDate::from_ymd_opt(2019, 1, 25).unwrap(),
            duration: Duration::from_secs(99 * 60 + 31),
        };
        assert_eq!(program.duration_secs(), 5971);
    }
}
