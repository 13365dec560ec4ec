use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::analyzers::breakdown::event_type_details;
use crate::analyzers::countries::CountryNames;
use crate::analyzers::types::{
    CountryCount, DeviceCount, EventBucket, EventOverview, Header, ReferralCount, RepeatBucket,
    Report,
};
use crate::analyzers::utility::{mean, percentile_of_score, quantile, rank_by_count};
use crate::config::ReportConfig;
use crate::filter::FilteredEvents;
use crate::records::{EventData, WebsiteEvent};

/// Inclusive per-user event count ranges; `None` is unbounded.
pub static EVENT_BUCKETS: &[(usize, Option<usize>)] = &[
    (0, Some(1)),
    (2, Some(5)),
    (6, Some(10)),
    (11, Some(20)),
    (21, Some(30)),
    (31, None),
];

pub const DIRECT_LABEL: &str = "direct";
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Distinct session ids in first-seen order.
pub fn unique_users(events: &[WebsiteEvent]) -> Vec<&str> {
    let mut seen = HashSet::new();
    events
        .iter()
        .map(|e| e.session_id.as_str())
        .filter(|s| seen.insert(*s))
        .collect()
}

/// Distinct (session, visit) pairs in first-seen order.
pub fn visit_pairs(events: &[WebsiteEvent]) -> Vec<(&str, &str)> {
    let mut seen = HashSet::new();
    events
        .iter()
        .map(|e| (e.session_id.as_str(), e.visit_id.as_str()))
        .filter(|pair| seen.insert(*pair))
        .collect()
}

/// Distinct custom events per session.
pub fn events_per_session<'a>(rows: &[&'a EventData]) -> HashMap<&'a str, usize> {
    let mut seen = HashSet::new();
    let mut counts = HashMap::new();
    for row in rows {
        if seen.insert(row.event_id.as_str()) {
            *counts.entry(row.session_id.as_str()).or_insert(0) += 1;
        }
    }
    counts
}

/// Sessions per country, using each session's first recorded country.
pub fn country_distribution(events: &[WebsiteEvent], names: &dyn CountryNames) -> Vec<CountryCount> {
    let mut seen = HashSet::new();
    let codes = events
        .iter()
        .filter(|e| seen.insert(e.session_id.as_str()))
        .map(|e| e.country.as_deref());

    rank_by_count(codes)
        .into_iter()
        .map(|(code, sessions)| CountryCount {
            code: code.map(str::to_string),
            name: code
                .map(|c| names.display_name(c).to_string())
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
            sessions,
        })
        .collect()
}

/// Number of sessions with exactly N visits, for every N from 1 to the
/// largest visit count, with the custom events fired by those sessions.
pub fn repeat_visits(
    pairs: &[(&str, &str)],
    session_events: &HashMap<&str, usize>,
) -> Vec<RepeatBucket> {
    let mut visits_per_session: HashMap<&str, usize> = HashMap::new();
    for &(session, _) in pairs {
        *visits_per_session.entry(session).or_insert(0) += 1;
    }

    let mut by_visits: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for (session, visits) in &visits_per_session {
        let bucket = by_visits.entry(*visits).or_insert((0, 0));
        bucket.0 += 1;
        bucket.1 += session_events.get(session).copied().unwrap_or(0);
    }

    let max = by_visits.keys().next_back().copied().unwrap_or(0);
    (1..=max)
        .map(|visits| {
            let (sessions, events) = by_visits.get(&visits).copied().unwrap_or((0, 0));
            RepeatBucket {
                visits,
                sessions,
                events,
            }
        })
        .collect()
}

/// Sessions per device; a session counts once for each device it used.
/// Rows without a device are not counted.
pub fn device_distribution(events: &[WebsiteEvent]) -> Vec<DeviceCount> {
    let mut seen = HashSet::new();
    let devices = events
        .iter()
        .filter_map(|e| Some((e.session_id.as_str(), e.device.as_deref()?)))
        .filter(|pair| seen.insert(*pair))
        .map(|(_, device)| device);

    rank_by_count(devices)
        .into_iter()
        .map(|(device, sessions)| DeviceCount {
            device: device.to_string(),
            sessions,
        })
        .collect()
}

/// Visits per referrer domain; visits with no referrer are direct traffic.
pub fn referral_distribution(events: &[WebsiteEvent], config: &ReportConfig) -> Vec<ReferralCount> {
    let mut seen = HashSet::new();
    let domains = events
        .iter()
        .map(|e| (e.visit_id.as_str(), e.referrer_domain.as_deref()))
        .filter(|pair| seen.insert(*pair))
        .map(|(_, domain)| domain);

    rank_by_count(domains)
        .into_iter()
        .map(|(domain, visits)| ReferralCount {
            domain: domain.map(str::to_string),
            label: domain
                .map(|d| config.referrer_name(d).to_string())
                .unwrap_or_else(|| DIRECT_LABEL.to_string()),
            visits,
        })
        .collect()
}

/// Event count statistics over one entry per user, zero-event users included.
pub fn event_overview(counts: &[usize]) -> Option<EventOverview> {
    if counts.is_empty() {
        return None;
    }

    let mut sorted: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    sorted.sort_by(f64::total_cmp);

    let avg = mean(&sorted);
    let buckets = EVENT_BUCKETS
        .iter()
        .map(|&(min, max)| EventBucket {
            min,
            max,
            users: counts
                .iter()
                .filter(|&&c| c >= min && max.is_none_or(|m| c <= m))
                .count(),
        })
        .collect();

    Some(EventOverview {
        users: counts.len(),
        mean: avg,
        mean_percentile: percentile_of_score(&sorted, avg)?,
        q25: quantile(&sorted, 0.25)?,
        q50: quantile(&sorted, 0.5)?,
        q75: quantile(&sorted, 0.75)?,
        max: counts.iter().copied().max().unwrap_or(0),
        buckets,
    })
}

/// Builds every report section from the filtered tables.
///
/// Custom events count only when their session is a real user, i.e. it has
/// at least one surviving website event.
#[tracing::instrument(skip_all, fields(events = filtered.events.len()))]
pub fn build_report(
    filtered: &FilteredEvents,
    processed_records: usize,
    dev_sessions: usize,
    config: &ReportConfig,
    countries: &dyn CountryNames,
) -> Report {
    let events = &filtered.events;
    let users = unique_users(events);
    let user_set: HashSet<&str> = users.iter().copied().collect();

    let real_rows: Vec<&EventData> = filtered
        .event_data
        .iter()
        .filter(|r| user_set.contains(r.session_id.as_str()))
        .collect();
    let session_events = events_per_session(&real_rows);

    let pairs = visit_pairs(events);
    let counts: Vec<usize> = users
        .iter()
        .map(|s| session_events.get(s).copied().unwrap_or(0))
        .collect();

    let header = Header {
        processed_records,
        removed_records: processed_records.saturating_sub(events.len()),
        real_events: events.len(),
        first_event: events.iter().map(|e| e.created_at).min(),
        last_event: events.iter().map(|e| e.created_at).max(),
        unique_users: users.len(),
        real_visits: pairs.len(),
        real_page_views: events.iter().filter(|e| e.is_page_view()).count(),
        dev_sessions,
    };

    Report {
        site_name: config.site_name.clone(),
        generated_at: Utc::now(),
        header,
        countries: country_distribution(events, countries),
        repeat_visits: repeat_visits(&pairs, &session_events),
        devices: device_distribution(events),
        referrals: referral_distribution(events, config),
        events: event_overview(&counts),
        event_types: event_type_details(&real_rows, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::countries::IsoCountries;
    use crate::filter::tests::{at, custom, data, view};

    fn with_referrer(mut e: WebsiteEvent, domain: &str) -> WebsiteEvent {
        e.referrer_domain = Some(domain.into());
        e
    }

    fn with_device(mut e: WebsiteEvent, device: &str) -> WebsiteEvent {
        e.device = Some(device.into());
        e
    }

    fn with_country(mut e: WebsiteEvent, country: &str) -> WebsiteEvent {
        e.country = Some(country.into());
        e
    }

    #[test]
    fn test_repeat_visits_partition_visit_pairs() {
        let events = vec![
            view("e1", "A", "V1", at(14, 1)),
            view("e2", "A", "V1", at(14, 2)),
            view("e3", "B", "V2", at(14, 3)),
            view("e4", "B", "V3", at(15, 3)),
            view("e5", "B", "V4", at(16, 3)),
            view("e6", "C", "V5", at(16, 4)),
        ];
        let pairs = visit_pairs(&events);
        let buckets = repeat_visits(&pairs, &HashMap::new());

        let summary: Vec<(usize, usize)> = buckets.iter().map(|b| (b.visits, b.sessions)).collect();
        assert_eq!(summary, vec![(1, 2), (2, 0), (3, 1)]);

        let total: usize = buckets.iter().map(|b| b.visits * b.sessions).sum();
        assert_eq!(total, pairs.len());
    }

    #[test]
    fn test_repeat_visits_attribute_events() {
        let pairs = vec![("A", "V1"), ("B", "V2"), ("B", "V3")];
        let session_events = HashMap::from([("A", 3), ("B", 4)]);
        let buckets = repeat_visits(&pairs, &session_events);
        assert_eq!(buckets[0].events, 3);
        assert_eq!(buckets[1].events, 4);
    }

    #[test]
    fn test_device_counted_once_per_session() {
        let events = vec![
            with_device(view("e1", "A", "V1", at(14, 1)), "laptop"),
            with_device(view("e2", "A", "V2", at(15, 1)), "laptop"),
            with_device(view("e3", "A", "V3", at(16, 1)), "laptop"),
            with_device(view("e4", "A", "V4", at(16, 2)), "mobile"),
            with_device(view("e5", "B", "V5", at(16, 3)), "mobile"),
        ];
        let devices = device_distribution(&events);
        assert_eq!(
            devices,
            vec![
                DeviceCount { device: "mobile".into(), sessions: 2 },
                DeviceCount { device: "laptop".into(), sessions: 1 },
            ]
        );
    }

    #[test]
    fn test_missing_device_not_counted() {
        let mut no_device = view("e2", "B", "V2", at(14, 2));
        no_device.device = None;
        let events = vec![
            with_device(view("e1", "A", "V1", at(14, 1)), "laptop"),
            no_device,
            with_device(view("e3", "B", "V2", at(14, 3)), "mobile"),
        ];
        let devices = device_distribution(&events);
        assert_eq!(
            devices,
            vec![
                DeviceCount { device: "laptop".into(), sessions: 1 },
                DeviceCount { device: "mobile".into(), sessions: 1 },
            ]
        );
    }

    #[test]
    fn test_referrals_direct_and_mapped() {
        let events = vec![
            view("e1", "A", "V1", at(14, 1)),
            view("e2", "A", "V1", at(14, 2)),
            with_referrer(view("e3", "B", "V2", at(14, 3)), "github.com"),
            with_referrer(view("e4", "C", "V3", at(14, 4)), "example.org"),
            view("e5", "C", "V4", at(14, 5)),
        ];
        let referrals = referral_distribution(&events, &ReportConfig::default());

        let labels: Vec<(&str, usize)> = referrals.iter().map(|r| (r.label.as_str(), r.visits)).collect();
        assert_eq!(labels, vec![("direct", 2), ("GitHub", 1), ("example.org", 1)]);
        assert_eq!(referrals[0].domain, None);
    }

    #[test]
    fn test_country_uses_first_country_per_session() {
        let events = vec![
            with_country(view("e1", "A", "V1", at(14, 1)), "DE"),
            with_country(view("e2", "A", "V2", at(15, 1)), "FR"),
            with_country(view("e3", "B", "V3", at(15, 2)), "FR"),
            with_country(view("e4", "C", "V4", at(15, 3)), "QZ"),
            with_country(view("e5", "D", "V5", at(15, 4)), "DE"),
        ];
        let countries = country_distribution(&events, &IsoCountries);

        let names: Vec<(&str, usize)> = countries.iter().map(|c| (c.name.as_str(), c.sessions)).collect();
        assert_eq!(names, vec![("Germany", 2), ("France", 1), ("QZ", 1)]);
    }

    #[test]
    fn test_event_overview_statistics() {
        let overview = event_overview(&[0, 0, 1, 3, 10]).unwrap();
        assert_eq!(overview.users, 5);
        assert!((overview.mean - 2.8).abs() < 1e-9);
        // 3 values below 2.8, none equal
        assert!((overview.mean_percentile - 60.0).abs() < 1e-9);
        assert_eq!((overview.q25, overview.q50, overview.q75), (0.0, 1.0, 3.0));
        assert_eq!(overview.max, 10);

        let users: Vec<usize> = overview.buckets.iter().map(|b| b.users).collect();
        assert_eq!(users, vec![3, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_event_overview_empty_and_single() {
        assert_eq!(event_overview(&[]), None);

        let single = event_overview(&[4]).unwrap();
        assert_eq!(single.q25, 4.0);
        assert_eq!(single.mean_percentile, 100.0);
    }

    #[test]
    fn test_event_buckets_bounds_inclusive() {
        let overview = event_overview(&[1, 2, 5, 6, 30, 31, 200]).unwrap();
        let users: Vec<usize> = overview.buckets.iter().map(|b| b.users).collect();
        assert_eq!(users, vec![1, 2, 1, 0, 1, 2]);
    }

    #[test]
    fn test_build_report_distribution_covers_every_user() {
        let mut events: Vec<WebsiteEvent> = (0..10)
            .map(|i| view(&format!("v{i}"), &format!("S{i}"), &format!("V{i}"), at(14, i)))
            .collect();
        events.push(custom("c1", "S0", "V0", "timer-used", at(15, 1)));
        events.push(custom("c2", "S0", "V0", "timer-used", at(15, 2)));
        events.push(custom("c3", "S1", "V1", "timer-used", at(15, 3)));

        let filtered = FilteredEvents {
            events,
            event_data: vec![
                data("c1", "S0", "timer-used", "event", "play", at(15, 1)),
                data("c1", "S0", "timer-used", "currentTime", "60", at(15, 1)),
                data("c2", "S0", "timer-used", "event", "pause", at(15, 2)),
                data("c3", "S1", "timer-used", "event", "play", at(15, 3)),
                data("orphan", "ZZ", "timer-used", "event", "play", at(15, 4)),
            ],
            ..Default::default()
        };

        let report = build_report(&filtered, 20, 1, &ReportConfig::default(), &IsoCountries);
        let overview = report.events.unwrap();
        assert_eq!(overview.users, 10);
        assert_eq!(report.header.unique_users, 10);
        assert_eq!(report.header.removed_records, 7);
        assert_eq!(report.header.real_page_views, 10);
        assert_eq!(overview.max, 2);
        assert_eq!(overview.buckets[0].users, 9);
        assert_eq!(report.event_types[0].total, 3);
    }

    #[test]
    fn test_build_report_no_users() {
        let report = build_report(
            &FilteredEvents::default(),
            4,
            2,
            &ReportConfig::default(),
            &IsoCountries,
        );
        assert_eq!(report.header.unique_users, 0);
        assert_eq!(report.header.removed_records, 4);
        assert!(report.events.is_none());
        assert!(report.repeat_visits.is_empty());
    }
}
