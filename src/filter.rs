//! Removes events that are not attributable to real, post-rollout usage.
//!
//! Three rules apply:
//! - every event under a visit that has a record before `go_live`, or that
//!   belongs to a developer session, is dropped (the whole visit, not just
//!   the offending rows);
//! - `notes-updated` fired on every autosave until `notes_fix`, so before
//!   that instant only the earliest event per (session, note length) is kept;
//! - custom event rows are dropped when their event id fell with a bad visit.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::classify::DevSessions;
use crate::records::{EventData, WebsiteEvent};

pub const NOTES_UPDATED: &str = "notes-updated";
pub const NOTES_LENGTH_KEY: &str = "length";

/// Instants that bound trustworthy data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoffs {
    pub go_live: DateTime<Utc>,
    pub notes_fix: DateTime<Utc>,
}

/// Row counts removed by each rule.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterStats {
    pub bad_visits: usize,
    pub bad_visit_events: usize,
    pub duplicate_notes_events: usize,
    pub dropped_event_data: usize,
}

/// The real, valid subset of both event tables.
#[derive(Debug, Clone, Default)]
pub struct FilteredEvents {
    pub events: Vec<WebsiteEvent>,
    pub event_data: Vec<EventData>,
    pub stats: FilterStats,
}

/// Visit ids with any row before `go_live` or any row from a developer session.
pub fn bad_visit_ids<'a>(
    events: &'a [WebsiteEvent],
    dev: &DevSessions,
    go_live: DateTime<Utc>,
) -> HashSet<&'a str> {
    events
        .iter()
        .filter(|e| e.created_at < go_live || dev.contains(&e.session_id))
        .map(|e| e.visit_id.as_str())
        .collect()
}

/// Event ids of the earliest `notes-updated` length record per
/// (session, length). Equal timestamps keep export order.
pub fn first_notes_event_ids(event_data: &[EventData]) -> HashSet<&str> {
    let mut earliest: HashMap<(&str, &str), &EventData> = HashMap::new();

    for row in event_data
        .iter()
        .filter(|r| r.event_name == NOTES_UPDATED && r.data_key == NOTES_LENGTH_KEY)
    {
        let key = (row.session_id.as_str(), row.value());
        match earliest.get(&key) {
            Some(kept) if kept.created_at <= row.created_at => {}
            _ => {
                earliest.insert(key, row);
            }
        }
    }

    earliest.values().map(|r| r.event_id.as_str()).collect()
}

fn is_overfired(
    name: Option<&str>,
    created_at: DateTime<Utc>,
    event_id: &str,
    notes_fix: DateTime<Utc>,
    valid_notes: &HashSet<&str>,
) -> bool {
    name == Some(NOTES_UPDATED) && created_at < notes_fix && !valid_notes.contains(event_id)
}

/// Applies every filtering rule and returns new tables; inputs are untouched.
#[tracing::instrument(skip_all, fields(events = events.len(), event_data = event_data.len()))]
pub fn filter_events(
    events: &[WebsiteEvent],
    event_data: &[EventData],
    dev: &DevSessions,
    cutoffs: &Cutoffs,
) -> FilteredEvents {
    let mut stats = FilterStats::default();

    let bad_visits = bad_visit_ids(events, dev, cutoffs.go_live);
    stats.bad_visits = bad_visits.len();

    let (kept, dropped): (Vec<&WebsiteEvent>, Vec<&WebsiteEvent>) = events
        .iter()
        .partition(|e| !bad_visits.contains(e.visit_id.as_str()));
    stats.bad_visit_events = dropped.len();
    let bad_event_ids: HashSet<&str> = dropped.iter().map(|e| e.event_id.as_str()).collect();

    let valid_notes = first_notes_event_ids(event_data);
    debug!(valid_notes = valid_notes.len(), "First notes-updated events found");

    let real_events: Vec<WebsiteEvent> = kept
        .into_iter()
        .filter(|e| {
            let overfired = is_overfired(
                e.event_name.as_deref(),
                e.created_at,
                &e.event_id,
                cutoffs.notes_fix,
                &valid_notes,
            );
            if overfired {
                stats.duplicate_notes_events += 1;
            }
            !overfired
        })
        .cloned()
        .collect();

    let real_event_data: Vec<EventData> = event_data
        .iter()
        .filter(|r| {
            !is_overfired(
                Some(r.event_name.as_str()),
                r.created_at,
                &r.event_id,
                cutoffs.notes_fix,
                &valid_notes,
            ) && !bad_event_ids.contains(r.event_id.as_str())
                && !dev.contains(&r.session_id)
                && r.created_at >= cutoffs.go_live
        })
        .cloned()
        .collect();
    stats.dropped_event_data = event_data.len() - real_event_data.len();

    info!(
        bad_visits = stats.bad_visits,
        bad_visit_events = stats.bad_visit_events,
        duplicate_notes_events = stats.duplicate_notes_events,
        dropped_event_data = stats.dropped_event_data,
        "Events filtered"
    );

    FilteredEvents {
        events: real_events,
        event_data: real_event_data,
        stats,
    }
}
