//! Persistence of reported events.
//!
//! Two files live in the data directory: a JSON snapshot of the last reported
//! event, used to avoid reporting the same event again after a restart, and an
//! append-only human-readable log of every reported event.
//!
//! Neither may block an alert. Read failures degrade to "nothing stored" and
//! write failures are logged and dropped.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::filter::EvaluatedEvent;
use crate::error::{QuakeError, Result};

/// Snapshot of the last event that was reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub magnitude: f64,
    pub depth: f64,
    #[serde(rename = "location")]
    pub place: String,
    /// Local origin time, `YYYY-MM-DD HH:MM:SS`
    pub time: String,
    pub distance: f64,
}

impl From<&EvaluatedEvent> for AlertRecord {
    fn from(event: &EvaluatedEvent) -> Self {
        Self {
            id: event.record.id.clone(),
            magnitude: event.record.magnitude,
            depth: event.record.depth_km,
            place: event.record.place.clone(),
            time: format_event_time(event.record.time_ms),
            distance: event.distance_km,
        }
    }
}

/// Format an epoch-millisecond timestamp in local time
pub fn format_event_time(time_ms: i64) -> String {
    match Local.timestamp_millis_opt(time_ms).single() {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("@{}ms", time_ms),
    }
}

/// Remembers the last reported event across restarts
pub trait DedupStore {
    /// Identifier of the last reported event, if any could be read
    fn load(&self) -> Option<String>;

    /// Persist a new last-reported event. Failures are logged, never returned.
    fn save(&self, record: &AlertRecord);
}

/// [`DedupStore`] backed by a JSON file
pub struct JsonDedupStore {
    path: PathBuf,
}

impl JsonDedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full stored record
    pub fn read_record(&self) -> Result<Option<AlertRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    fn write_record(&self, record: &AlertRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, data)
            .map_err(|e| QuakeError::persistence(format!("{:?}: {}", self.path, e)))
    }
}

impl DedupStore for JsonDedupStore {
    fn load(&self) -> Option<String> {
        match self.read_record() {
            Ok(record) => record.map(|r| r.id),
            Err(e) => {
                log::error!("Failed to load last event from {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn save(&self, record: &AlertRecord) {
        if let Err(e) = self.write_record(record) {
            log::error!("Failed to save last event: {}", e);
        }
    }
}

/// Append-only, human-readable log of reported events
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Failures are logged, never returned.
    pub fn append(&self, record: &AlertRecord) {
        if let Err(e) = self.try_append(record) {
            log::error!("Failed to write event log {:?}: {}", self.path, e);
        }
    }

    fn try_append(&self, record: &AlertRecord) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let detected_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        file.write_all(format_log_entry(record, &detected_at).as_bytes())
    }
}

fn format_log_entry(record: &AlertRecord, detected_at: &str) -> String {
    format!(
        "=== EARTHQUAKE DETECTED: {} ===\n\
         ID: {}\n\
         Location: {}\n\
         Magnitude: {}\n\
         Depth: {} km\n\
         Time: {}\n\
         Distance: {:.2} km\n\n",
        detected_at,
        record.id,
        record.place,
        record.magnitude,
        record.depth,
        record.time,
        record.distance
    )
}
