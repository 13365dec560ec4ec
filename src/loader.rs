//! CSV loading for the session, website event, and event data exports.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::records::{EventData, SessionAttribute, Snapshot, WebsiteEvent};

pub const SESSION_DATA_FILE: &str = "session_data.csv";
pub const WEBSITE_EVENT_FILE: &str = "website_event.csv";
pub const EVENT_DATA_FILE: &str = "event_data.csv";

/// Locations of the three exports.
#[derive(Debug, Clone, PartialEq)]
pub struct InputPaths {
    pub sessions: PathBuf,
    pub events: PathBuf,
    pub event_data: PathBuf,
}

impl InputPaths {
    /// Uses the default export file names inside `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            sessions: dir.join(SESSION_DATA_FILE),
            events: dir.join(WEBSITE_EVENT_FILE),
            event_data: dir.join(EVENT_DATA_FILE),
        }
    }
}

/// Deserializes every row of a CSV stream. Columns not present on `T` are ignored.
pub fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: T = result?;
        rows.push(record);
    }

    Ok(rows)
}

fn read_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_rows(file).with_context(|| format!("failed to parse {}", path.display()))
}

/// Loads all three exports. Any missing or malformed file aborts the load.
#[tracing::instrument(skip_all, fields(sessions = %paths.sessions.display()))]
pub fn load_snapshot(paths: &InputPaths) -> Result<Snapshot> {
    let sessions: Vec<SessionAttribute> = read_file(&paths.sessions)?;
    let events: Vec<WebsiteEvent> = read_file(&paths.events)?;
    let event_data: Vec<EventData> = read_file(&paths.event_data)?;

    info!(
        session_rows = sessions.len(),
        event_rows = events.len(),
        event_data_rows = event_data.len(),
        "Exports loaded"
    );

    Ok(Snapshot {
        sessions,
        events,
        event_data,
    })
}
