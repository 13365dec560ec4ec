use crate::analyzers::aggregate::build_report;
use crate::analyzers::countries::CountryNames;
use crate::analyzers::types::Report;
use crate::classify::classify_sessions;
use crate::config::ReportConfig;
use crate::filter::{Cutoffs, filter_events};
use crate::records::Snapshot;
use tracing::info;

/// Runs classification, filtering and aggregation over a loaded snapshot.
pub fn analyze(snapshot: &Snapshot, config: &ReportConfig, countries: &dyn CountryNames) -> Report {
    let dev = classify_sessions(&snapshot.sessions, &config.blackout);

    let cutoffs = Cutoffs {
        go_live: config.go_live,
        notes_fix: config.notes_fix,
    };
    let filtered = filter_events(&snapshot.events, &snapshot.event_data, &dev, &cutoffs);

    let report = build_report(
        &filtered,
        snapshot.events.len(),
        dev.len(),
        config,
        countries,
    );

    info!(
        unique_users = report.header.unique_users,
        real_visits = report.header.real_visits,
        event_types = report.event_types.len(),
        "Report aggregated"
    );

    report
}
