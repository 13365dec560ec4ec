//! Report rendering and persistence.
//!
//! Renders a [`Report`] as human-readable lines, writes them to a text file,
//! and optionally serializes the report as JSON.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{EventOverview, EventTypeDetail, Report};

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

/// Formats with at most two decimals and no trailing zeros.
fn num(value: f64) -> String {
    let s = format!("{:.2}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn header_lines(report: &Report, lines: &mut Vec<String>) {
    let h = &report.header;
    let ts = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "n/a".to_string())
    };
    let countries: Vec<String> = report
        .countries
        .iter()
        .map(|c| format!("{} ({})", c.name, c.sessions))
        .collect();

    lines.push("###".into());
    lines.push(format!(
        "Processed {} records, removed {} development/old/invalid events from that.",
        h.processed_records, h.removed_records
    ));
    lines.push(format!(
        "The following statistics are based on the remaining {} real user events.",
        h.real_events
    ));
    lines.push(format!(
        "From the first record at {} to the last record at {} in UTC",
        ts(h.first_event),
        ts(h.last_event)
    ));
    lines.push("###".into());
    lines.push(format!("Number of unique real people: {}", h.unique_users));
    lines.push(format!(
        "They come from {} different {}: {}",
        countries.len(),
        plural(countries.len(), "country", "countries"),
        countries.join(", ")
    ));
    lines.push(format!("Number of real user page visits: {}", h.real_visits));
    lines.push(format!("Number of real user page views: {}", h.real_page_views));
    lines.push("---".into());
    lines.push(String::new());
}

fn overview_lines(overview: &EventOverview, lines: &mut Vec<String>) {
    lines.push(format!(
        "There are {} users, and on average, each user does about {} events. \
         This is more than {}% of users. 75% of users have at least {} events, \
         50% of users have at least {} events, and 25% of users have at least {} events. \
         The user with the most events has {} events.",
        overview.users,
        num(overview.mean),
        num(overview.mean_percentile),
        num(overview.q25),
        num(overview.q50),
        num(overview.q75),
        overview.max
    ));
    for bucket in &overview.buckets {
        let range = match bucket.max {
            Some(max) => format!("{}-{}", bucket.min, max),
            None => format!("{}+", bucket.min),
        };
        lines.push(format!(
            "{} {} {} events",
            bucket.users,
            plural(bucket.users, "user has", "users have"),
            range
        ));
    }
}

fn detail_line(detail: &EventTypeDetail) -> String {
    let mut line = format!(
        "{}: {} {}",
        detail.event_name,
        detail.total,
        plural(detail.total, "event", "events")
    );
    if detail.breakdown.is_empty() {
        return line;
    }

    let entry = |label: &str, count: usize| match &detail.breakdown_label {
        Some(_) => format!("{} ({})", label, count),
        None => format!("{} {}", count, label),
    };
    let parts: Vec<String> = detail
        .breakdown
        .iter()
        .map(|b| entry(&b.label, b.count))
        .collect();

    match &detail.breakdown_label {
        Some(label) => line.push_str(&format!(" ({}: {})", label, parts.join(", "))),
        None => line.push_str(&format!(" ({})", parts.join(", "))),
    }
    line
}

/// Renders every report section as text lines.
pub fn render_report(report: &Report) -> Vec<String> {
    let mut lines = Vec::new();
    let site = &report.site_name;
    let users = report.header.unique_users;

    header_lines(report, &mut lines);

    lines.push("== Repeat visitors ==".into());
    for bucket in &report.repeat_visits {
        lines.push(format!(
            "{} {} visited exactly {} {} ({} {})",
            bucket.sessions,
            plural(bucket.sessions, "person", "people"),
            bucket.visits,
            plural(bucket.visits, "time", "times"),
            bucket.events,
            plural(bucket.events, "event", "events")
        ));
    }
    lines.push(String::new());

    lines.push("== Devices used ==".into());
    for device in &report.devices {
        lines.push(format!(
            "{} {} using a {}",
            device.sessions,
            plural(device.sessions, "user is", "users are"),
            device.device
        ));
    }
    lines.push(format!(
        "Note that one user can use multiple devices, so total may not add to {} (total # of users)",
        users
    ));
    lines.push(String::new());

    lines.push("== Visitor referrals ==".into());
    for referral in &report.referrals {
        let who = plural(referral.visits, "user", "users");
        match referral.domain {
            None => lines.push(format!(
                "{} {} visited {} directly (not referred)",
                referral.visits, who, site
            )),
            Some(_) => lines.push(format!(
                "{} {} reached {} via {}",
                referral.visits, who, site, referral.label
            )),
        }
    }
    lines.push(format!(
        "Note that one user can visit multiple times, so total may not add to {} (total # of users)",
        users
    ));
    lines.push(String::new());

    lines.push("== Events overview ==".into());
    match &report.events {
        Some(overview) => overview_lines(overview, &mut lines),
        None => lines.push("No real users, so there are no event statistics.".into()),
    }
    lines.push(String::new());

    lines.push("== Event details ==".into());
    if report.event_types.is_empty() {
        lines.push("No events recorded.".into());
    }
    lines.extend(report.event_types.iter().map(detail_line));

    lines
}

/// Writes rendered lines to `path`, one per line.
pub fn write_report(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), lines = lines.len(), "Report written");
    Ok(())
}

/// Writes the report as pretty-printed JSON.
pub fn write_json(path: &Path, report: &Report) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "JSON report written");
    Ok(())
}
