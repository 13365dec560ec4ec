//! Developer/test session detection.
//!
//! A session is a developer session when any one of its attribute rows
//! matches a [`DevRule`]. Sessions without attribute rows are real.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::config::BlackoutRule;
use crate::records::SessionAttribute;

/// Rule that disqualified a session. Ordered so that a session matching
/// several rules always reports the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DevRule {
    /// `env=dev`
    EnvDev,
    /// Any `profile` attribute; only testing devices set one.
    Profile,
    /// Blackout key/value recorded inside the blackout window.
    Blackout,
}

impl fmt::Display for DevRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DevRule::EnvDev => "env=dev",
            DevRule::Profile => "profile",
            DevRule::Blackout => "blackout",
        };
        f.write_str(s)
    }
}

/// Developer session ids with the rule each one matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevSessions {
    ids: BTreeMap<String, DevRule>,
}

impl DevSessions {
    pub fn contains(&self, session_id: &str) -> bool {
        self.ids.contains_key(session_id)
    }

    pub fn rule_for(&self, session_id: &str) -> Option<DevRule> {
        self.ids.get(session_id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates in session id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, DevRule)> {
        self.ids.iter().map(|(id, rule)| (id.as_str(), *rule))
    }
}

fn matching_rule(attr: &SessionAttribute, blackout: &BlackoutRule) -> Option<DevRule> {
    let value = attr.string_value.as_deref();
    match attr.data_key.as_str() {
        "env" if value == Some("dev") => Some(DevRule::EnvDev),
        "profile" => Some(DevRule::Profile),
        key if key == blackout.key
            && value == Some(blackout.value.as_str())
            && blackout.contains(attr.created_at) =>
        {
            Some(DevRule::Blackout)
        }
        _ => None,
    }
}

/// Classifies every session that has at least one disqualifying attribute.
#[tracing::instrument(skip_all, fields(rows = attrs.len()))]
pub fn classify_sessions(attrs: &[SessionAttribute], blackout: &BlackoutRule) -> DevSessions {
    let mut ids: BTreeMap<String, DevRule> = BTreeMap::new();

    for attr in attrs {
        let Some(rule) = matching_rule(attr, blackout) else {
            continue;
        };
        ids.entry(attr.session_id.clone())
            .and_modify(|existing| *existing = (*existing).min(rule))
            .or_insert(rule);
    }

    info!(dev_sessions = ids.len(), "Developer sessions classified");
    DevSessions { ids }
}
