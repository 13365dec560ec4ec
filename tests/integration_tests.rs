use std::path::Path;

use visit_report::analyzers::analyzer::analyze;
use visit_report::analyzers::countries::IsoCountries;
use visit_report::classify::{DevRule, classify_sessions};
use visit_report::config::ReportConfig;
use visit_report::loader::{InputPaths, load_snapshot};
use visit_report::output::{render_report, write_report};

fn fixtures() -> InputPaths {
    InputPaths::from_dir(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

#[test]
fn test_dev_sessions_from_fixture() {
    let snapshot = load_snapshot(&fixtures()).expect("Failed to load fixtures");
    let dev = classify_sessions(&snapshot.sessions, &ReportConfig::default().blackout);

    let ids: Vec<(&str, DevRule)> = dev.iter().collect();
    assert_eq!(
        ids,
        vec![
            ("s-dev", DevRule::EnvDev),
            ("s-prof", DevRule::Profile),
            ("s-school", DevRule::Blackout),
        ]
    );
}

#[test]
fn test_full_pipeline() {
    let snapshot = load_snapshot(&fixtures()).expect("Failed to load fixtures");
    let report = analyze(&snapshot, &ReportConfig::default(), &IsoCountries);

    let h = &report.header;
    assert_eq!(h.processed_records, 13);
    assert_eq!(h.removed_records, 6);
    assert_eq!(h.unique_users, 3);
    assert_eq!(h.real_visits, 4);
    assert_eq!(h.real_page_views, 4);
    assert_eq!(h.dev_sessions, 3);

    let countries: Vec<&str> = report.countries.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(countries, vec!["United States", "Germany", "France"]);

    let repeats: Vec<(usize, usize, usize)> = report
        .repeat_visits
        .iter()
        .map(|b| (b.visits, b.sessions, b.events))
        .collect();
    assert_eq!(repeats, vec![(1, 2, 1), (2, 1, 2)]);

    let devices: Vec<(&str, usize)> = report
        .devices
        .iter()
        .map(|d| (d.device.as_str(), d.sessions))
        .collect();
    assert_eq!(devices, vec![("laptop", 2), ("mobile", 2)]);

    let referrals: Vec<(&str, usize)> = report
        .referrals
        .iter()
        .map(|r| (r.label.as_str(), r.visits))
        .collect();
    assert_eq!(referrals, vec![("direct", 2), ("GitHub", 1), ("Slack App", 1)]);

    let overview = report.events.as_ref().expect("real users present");
    assert_eq!(overview.users, 3);
    assert_eq!(overview.max, 2);
    assert!((overview.mean - 1.0).abs() < 1e-9);
    assert_eq!((overview.q25, overview.q50, overview.q75), (0.5, 1.0, 1.5));

    let totals: Vec<(&str, usize)> = report
        .event_types
        .iter()
        .map(|d| (d.event_name.as_str(), d.total))
        .collect();
    assert_eq!(totals, vec![("notes-updated", 2), ("get-pwa-clicked", 1)]);
}

#[test]
fn test_report_file_written() {
    let snapshot = load_snapshot(&fixtures()).expect("Failed to load fixtures");
    let report = analyze(&snapshot, &ReportConfig::default(), &IsoCountries);
    let lines = render_report(&report);

    let path = std::env::temp_dir().join("visit_report_integration.txt");
    write_report(&path, &lines).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("Number of unique real people: 3"));
    assert!(content.contains("1 user reached TC22 via Slack App"));
    assert!(content.contains("get-pwa-clicked: 1 event (1 accepted, 0 dismissed)"));

    std::fs::remove_file(&path).unwrap();
}
