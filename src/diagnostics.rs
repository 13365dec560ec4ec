//! Consistency checks over the raw website event export.

use std::collections::BTreeMap;

use crate::records::WebsiteEvent;

/// Visit ids recorded under more than one session id, with those session
/// ids in first-seen order. A visit should belong to exactly one session.
pub fn visits_with_multiple_sessions(events: &[WebsiteEvent]) -> Vec<(String, Vec<String>)> {
    let mut sessions_by_visit: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for event in events {
        let sessions = sessions_by_visit.entry(event.visit_id.as_str()).or_default();
        if !sessions.contains(&event.session_id.as_str()) {
            sessions.push(event.session_id.as_str());
        }
    }

    sessions_by_visit
        .into_iter()
        .filter(|(_, sessions)| sessions.len() > 1)
        .map(|(visit, sessions)| {
            (
                visit.to_string(),
                sessions.into_iter().map(str::to_string).collect(),
            )
        })
        .collect()
}
