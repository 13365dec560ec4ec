//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Record counts and totals shown at the top of the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Header {
    pub processed_records: usize,
    pub removed_records: usize,
    pub real_events: usize,
    pub first_event: Option<DateTime<Utc>>,
    pub last_event: Option<DateTime<Utc>>,
    pub unique_users: usize,
    pub real_visits: usize,
    pub real_page_views: usize,
    pub dev_sessions: usize,
}

/// Distinct sessions per country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryCount {
    pub code: Option<String>,
    pub name: String,
    pub sessions: usize,
}

/// Sessions that visited exactly `visits` times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatBucket {
    pub visits: usize,
    pub sessions: usize,
    /// Real custom events fired by those sessions.
    pub events: usize,
}

/// Distinct sessions per device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceCount {
    pub device: String,
    pub sessions: usize,
}

/// Distinct visits per referrer; `domain` is `None` for direct traffic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferralCount {
    pub domain: Option<String>,
    pub label: String,
    pub visits: usize,
}

/// Users whose event count falls in an inclusive range; `max` of `None` is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventBucket {
    pub min: usize,
    pub max: Option<usize>,
    pub users: usize,
}

/// Summary of the per-user event count distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOverview {
    pub users: usize,
    pub mean: f64,
    /// Percentile rank of the mean within the distribution.
    pub mean_percentile: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: usize,
    pub buckets: Vec<EventBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    pub label: String,
    pub count: usize,
}

/// Total for one event name plus its configured breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventTypeDetail {
    pub event_name: String,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown_label: Option<String>,
    pub breakdown: Vec<BreakdownEntry>,
}

/// Complete aggregation result for one export snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub site_name: String,
    pub generated_at: DateTime<Utc>,
    pub header: Header,
    pub countries: Vec<CountryCount>,
    pub repeat_visits: Vec<RepeatBucket>,
    pub devices: Vec<DeviceCount>,
    pub referrals: Vec<ReferralCount>,
    /// `None` when there are no real users.
    pub events: Option<EventOverview>,
    pub event_types: Vec<EventTypeDetail>,
}
