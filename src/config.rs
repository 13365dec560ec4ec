//! Business rules for a report run: cutoffs, the developer blackout window,
//! referrer display names, and per-event breakdown descriptors.
//!
//! Every field has a compiled-in default. A JSON file may override any
//! subset of them:
//! ```json
//! {
//!   "notes_fix": "2025-12-31T12:15:00Z",
//!   "referrers": { "news.ycombinator.com": "Hacker News" },
//!   "top_n": 3
//! }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Session attribute rule that only disqualifies inside an open time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackoutRule {
    pub key: String,
    pub value: String,
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
}

impl BlackoutRule {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts > self.after && ts < self.before
    }
}

/// One labelled count inside a [`Breakdown::Counts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountItem {
    pub label: String,
    /// Event to count; defaults to the event the detail belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub key: String,
    pub value: String,
}

/// Auxiliary statistics reported next to an event's total.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Breakdown {
    Counts {
        items: Vec<CountItem>,
    },
    TopValues {
        key: String,
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
    #[default]
    None,
}

/// Maps an event name to its breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    pub event_name: String,
    #[serde(default)]
    pub breakdown: Breakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Events before this instant predate the analytics rollout.
    pub go_live: DateTime<Utc>,
    /// `notes-updated` over-fired until this instant.
    pub notes_fix: DateTime<Utc>,
    pub blackout: BlackoutRule,
    pub referrers: BTreeMap<String, String>,
    pub event_details: Vec<EventDetail>,
    pub top_n: usize,
    pub site_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            go_live: utc(2025, 12, 13, 9, 30),
            notes_fix: utc(2025, 12, 31, 12, 15),
            blackout: BlackoutRule {
                key: "schoolId".into(),
                value: "2".into(),
                after: utc(2025, 12, 20, 0, 0),
                before: utc(2025, 12, 31, 0, 0),
            },
            referrers: [
                ("siege.hackclub.com", "Siege (via Hack Club)"),
                ("com.slack", "Slack App"),
                ("l.instagram.com", "Instagram"),
                ("m.facebook.com", "Facebook"),
                ("google.com", "Google"),
                ("github.com", "GitHub"),
            ]
            .into_iter()
            .map(|(domain, name)| (domain.to_string(), name.to_string()))
            .collect(),
            event_details: default_event_details(),
            top_n: 5,
            site_name: "TC22".into(),
        }
    }
}

impl ReportConfig {
    /// Loads overrides from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: ReportConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!(path = %path.display(), details = config.event_details.len(), "Config loaded");
        Ok(config)
    }

    /// Display name for a referrer domain, falling back to the domain itself.
    pub fn referrer_name<'a>(&'a self, domain: &'a str) -> &'a str {
        self.referrers.get(domain).map(String::as_str).unwrap_or(domain)
    }

    pub fn detail_for(&self, event_name: &str) -> Option<&EventDetail> {
        self.event_details.iter().find(|d| d.event_name == event_name)
    }
}

fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
        .single()
        .unwrap_or_default()
}

fn counts(event_name: &str, key: &str, items: &[(&str, &str)]) -> EventDetail {
    EventDetail {
        event_name: event_name.into(),
        breakdown: Breakdown::Counts {
            items: items
                .iter()
                .map(|(label, value)| CountItem {
                    label: (*label).into(),
                    event_name: None,
                    key: key.into(),
                    value: (*value).into(),
                })
                .collect(),
        },
    }
}

fn top_values(event_name: &str, key: &str, label: &str) -> EventDetail {
    EventDetail {
        event_name: event_name.into(),
        breakdown: Breakdown::TopValues {
            key: key.into(),
            label: label.into(),
            limit: None,
        },
    }
}

fn default_event_details() -> Vec<EventDetail> {
    let mut timer = counts(
        "timer-used",
        "event",
        &[("started", "play"), ("stopped", "pause"), ("muted", "mute"), ("unmuted", "unmute")],
    );
    if let Breakdown::Counts { items } = &mut timer.breakdown {
        items.push(CountItem {
            label: "reset".into(),
            event_name: Some("timer-restart".into()),
            key: "event".into(),
            value: "restart".into(),
        });
    }

    let toggled = [("opened", "open"), ("closed", "closed")];

    vec![
        timer,
        counts(
            "stopwatch-used",
            "event",
            &[("started", "play"), ("stopped", "pause"), ("reset", "restart")],
        ),
        counts(
            "get-pwa-clicked",
            "outcome",
            &[("accepted", "accepted"), ("dismissed", "dismissed")],
        ),
        counts("timer-toggled", "newState", &toggled),
        counts("stopwatch-toggled", "newState", &toggled),
        counts("notes-toggled", "newState", &toggled),
        counts(
            "toggle-fullscreen-clicked",
            "attemptedNewState",
            &[("entering", "fullscreen"), ("exiting", "no-fullscreen")],
        ),
        top_values("simulated-fullscreen-entered", "id", "most fullscreened"),
        top_values("setting-changed", "setting", "most changed settings"),
    ]
}
