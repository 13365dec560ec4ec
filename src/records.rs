//! Row types for the three analytics exports.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// `event_type` of a page view in the website event export.
pub const PAGE_VIEW: u8 = 1;
/// `event_type` of a custom application event.
pub const CUSTOM_EVENT: u8 = 2;

/// A single key/value attribute recorded against a session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionAttribute {
    pub session_id: String,
    pub data_key: String,
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// One row of the website event export: a page view or the visit-side
/// record of a custom event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebsiteEvent {
    pub event_id: String,
    pub session_id: String,
    pub visit_id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub url_path: Option<String>,
    #[serde(default)]
    pub referrer_domain: Option<String>,
    pub event_type: u8,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

impl WebsiteEvent {
    pub fn is_page_view(&self) -> bool {
        self.event_type == PAGE_VIEW
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.event_name.as_deref() == Some(name)
    }
}

/// One key/value attribute of a custom event. An event with several data
/// keys appears as several rows sharing an `event_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub event_id: String,
    pub session_id: String,
    pub event_name: String,
    pub data_key: String,
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl EventData {
    pub fn value(&self) -> &str {
        self.string_value.as_deref().unwrap_or("")
    }
}

/// The three exports, fully loaded.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub sessions: Vec<SessionAttribute>,
    pub events: Vec<WebsiteEvent>,
    pub event_data: Vec<EventData>,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an export timestamp. Zone-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 13, 9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-12-13 09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-12-13T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-12-13 09:30"), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_with_fraction_and_offset() {
        let ts = parse_timestamp("2025-12-13T10:30:00.250+01:00").unwrap();
        assert_eq!(ts.timestamp(), Utc.with_ymd_and_hms(2025, 12, 13, 9, 30, 0).unwrap().timestamp());
        assert_eq!(ts.timestamp_subsec_millis(), 250);

        let ts = parse_timestamp("2025-12-13 09:30:00.5+00").unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
