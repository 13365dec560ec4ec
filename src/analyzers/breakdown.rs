//! Per-event-type totals and the descriptor-driven breakdowns next to them.

use std::collections::HashSet;

use crate::analyzers::types::{BreakdownEntry, EventTypeDetail};
use crate::analyzers::utility::rank_by_count;
use crate::config::{Breakdown, ReportConfig};
use crate::records::EventData;

/// Distinct event ids among rows matching (name, key, value).
pub fn count_matching(rows: &[&EventData], event_name: &str, key: &str, value: &str) -> usize {
    rows.iter()
        .filter(|r| r.event_name == event_name && r.data_key == key && r.value() == value)
        .map(|r| r.event_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Most frequent values of `key` for `event_name`, one value per event id.
pub fn top_values(rows: &[&EventData], event_name: &str, key: &str, limit: usize) -> Vec<(String, usize)> {
    let mut seen = HashSet::new();
    let values = rows
        .iter()
        .filter(|r| r.event_name == event_name && r.data_key == key)
        .filter(|r| seen.insert(r.event_id.as_str()))
        .map(|r| r.value().to_string());

    let mut ranked = rank_by_count(values);
    ranked.truncate(limit);
    ranked
}

fn evaluate(
    breakdown: &Breakdown,
    rows: &[&EventData],
    event_name: &str,
    top_n: usize,
) -> (Option<String>, Vec<BreakdownEntry>) {
    match breakdown {
        Breakdown::Counts { items } => {
            let entries = items
                .iter()
                .map(|item| BreakdownEntry {
                    label: item.label.clone(),
                    count: count_matching(
                        rows,
                        item.event_name.as_deref().unwrap_or(event_name),
                        &item.key,
                        &item.value,
                    ),
                })
                .collect();
            (None, entries)
        }
        Breakdown::TopValues { key, label, limit } => {
            let entries = top_values(rows, event_name, key, limit.unwrap_or(top_n))
                .into_iter()
                .map(|(label, count)| BreakdownEntry { label, count })
                .collect();
            (Some(label.clone()), entries)
        }
        Breakdown::None => (None, Vec::new()),
    }
}

/// Totals per event name (distinct event ids), highest first, each with its
/// configured breakdown.
pub fn event_type_details(rows: &[&EventData], config: &ReportConfig) -> Vec<EventTypeDetail> {
    let mut seen = HashSet::new();
    let names = rows
        .iter()
        .filter(|r| seen.insert(r.event_id.as_str()))
        .map(|r| r.event_name.as_str());

    rank_by_count(names)
        .into_iter()
        .map(|(name, total)| {
            let (breakdown_label, breakdown) = match config.detail_for(name) {
                Some(detail) => evaluate(&detail.breakdown, rows, name, config.top_n),
                None => (None, Vec::new()),
            };
            EventTypeDetail {
                event_name: name.to_string(),
                total,
                breakdown_label,
                breakdown,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{at, data};

    fn timer_rows() -> Vec<EventData> {
        vec![
            data("t1", "A", "timer-used", "event", "play", at(14, 1)),
            data("t1", "A", "timer-used", "currentTime", "300", at(14, 1)),
            data("t2", "A", "timer-used", "event", "pause", at(14, 2)),
            data("t3", "B", "timer-used", "event", "play", at(14, 3)),
            data("t4", "B", "timer-used", "event", "mute", at(14, 4)),
            data("r1", "B", "timer-restart", "event", "restart", at(14, 5)),
        ]
    }

    #[test]
    fn test_totals_deduplicate_by_event_id() {
        let rows = timer_rows();
        let refs: Vec<&EventData> = rows.iter().collect();
        let details = event_type_details(&refs, &ReportConfig::default());

        assert_eq!(details[0].event_name, "timer-used");
        assert_eq!(details[0].total, 4);
        assert_eq!(details[1].event_name, "timer-restart");
        assert_eq!(details[1].total, 1);
    }

    #[test]
    fn test_counts_breakdown_reads_other_event_name() {
        let rows = timer_rows();
        let refs: Vec<&EventData> = rows.iter().collect();
        let details = event_type_details(&refs, &ReportConfig::default());

        let counts: Vec<(&str, usize)> = details[0]
            .breakdown
            .iter()
            .map(|b| (b.label.as_str(), b.count))
            .collect();
        assert_eq!(
            counts,
            vec![("started", 2), ("stopped", 1), ("muted", 1), ("unmuted", 0), ("reset", 1)]
        );
        assert_eq!(details[0].breakdown_label, None);
    }

    #[test]
    fn test_top_values_limit_and_tie_order() {
        let rows = vec![
            data("s1", "A", "setting-changed", "setting", "theme", at(14, 1)),
            data("s2", "A", "setting-changed", "setting", "font", at(14, 2)),
            data("s3", "B", "setting-changed", "setting", "clock", at(14, 3)),
            data("s4", "B", "setting-changed", "setting", "font", at(14, 4)),
            data("s5", "C", "setting-changed", "setting", "sound", at(14, 5)),
        ];
        let refs: Vec<&EventData> = rows.iter().collect();

        let top = top_values(&refs, "setting-changed", "setting", 3);
        assert_eq!(
            top,
            vec![("font".to_string(), 2), ("theme".to_string(), 1), ("clock".to_string(), 1)]
        );
    }

    #[test]
    fn test_top_values_uses_config_top_n() {
        let rows: Vec<EventData> = (0..8)
            .map(|i| {
                data(
                    &format!("f{i}"),
                    "A",
                    "simulated-fullscreen-entered",
                    "id",
                    &format!("widget-{i}"),
                    at(14, i),
                )
            })
            .collect();
        let refs: Vec<&EventData> = rows.iter().collect();
        let config = ReportConfig {
            top_n: 2,
            ..ReportConfig::default()
        };

        let details = event_type_details(&refs, &config);
        assert_eq!(details[0].total, 8);
        assert_eq!(details[0].breakdown.len(), 2);
        assert_eq!(details[0].breakdown_label.as_deref(), Some("most fullscreened"));
    }

    #[test]
    fn test_unknown_event_has_total_only() {
        let rows = vec![data("x1", "A", "page-printed", "copies", "1", at(14, 1))];
        let refs: Vec<&EventData> = rows.iter().collect();
        let details = event_type_details(&refs, &ReportConfig::default());
        assert_eq!(details.len(), 1);
        assert!(details[0].breakdown.is_empty());
    }
}
