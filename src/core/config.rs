use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::geo::Coordinate;
use crate::error::QuakeError;

pub const DEFAULT_FEED_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/4.5_hour.geojson";

/// Longest alarm the monitor will sound before stopping on its own
pub const MAX_ALARM_DURATION_SECS: u64 = 24 * 60 * 60;

/// Upper bound for a single feed request
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 300;

/// Keys accepted by [`Config::set`]
pub const CONFIG_KEYS: &[&str] = &[
    "latitude",
    "longitude",
    "max_distance_km",
    "evacuation_magnitude",
    "poll_interval_secs",
    "alarm_sound",
    "max_alarm_duration_secs",
    "feed_url",
    "data_dir",
    "fetch_timeout_secs",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Observation point
    pub location: Coordinate,
    pub max_distance_km: f64,
    /// Minimum magnitude that sounds the alarm instead of a passive report
    pub evacuation_magnitude: f64,
    pub poll_interval_secs: u64,
    /// Sound file played in a loop while an alert is active.
    /// Defaults to `alarm.mp3` inside the data directory.
    pub alarm_sound: Option<PathBuf>,
    pub max_alarm_duration_secs: u64,
    pub feed_url: String,
    pub data_dir: PathBuf,
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: Coordinate::new(4.6097, -74.0817),
            max_distance_km: 300.0,
            evacuation_magnitude: 4.5,
            poll_interval_secs: 10,
            alarm_sound: None,
            max_alarm_duration_secs: 120,
            feed_url: DEFAULT_FEED_URL.to_string(),
            data_dir: default_data_dir(),
            fetch_timeout_secs: 10,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("quakewatch"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl Config {
    /// Load the user's configuration, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        Ok(serde_json::from_str(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable config file {:?}: {}", path, e);
            Config::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("quakewatch").join("config.json"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_alarm_duration(&self) -> Duration {
        Duration::from_secs(self.max_alarm_duration_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn alarm_sound_path(&self) -> PathBuf {
        self.alarm_sound
            .clone()
            .unwrap_or_else(|| self.data_dir.join("alarm.mp3"))
    }

    pub fn last_quake_path(&self) -> PathBuf {
        self.data_dir.join("last_quake.json")
    }

    pub fn event_log_path(&self) -> PathBuf {
        self.data_dir.join("earthquake_log.txt")
    }

    pub fn system_log_path(&self) -> PathBuf {
        self.data_dir.join("system.log")
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let Coordinate {
            latitude,
            longitude,
        } = self.location;

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(QuakeError::config(format!(
                "latitude {} is outside [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(QuakeError::config(format!(
                "longitude {} is outside [-180, 180]",
                longitude
            )));
        }
        if !(self.max_distance_km > 0.0) {
            return Err(QuakeError::config("max_distance_km must be positive"));
        }
        if !self.evacuation_magnitude.is_finite() {
            return Err(QuakeError::config("evacuation_magnitude must be a number"));
        }
        if self.poll_interval_secs == 0 {
            return Err(QuakeError::config("poll_interval_secs must be at least 1"));
        }
        if !(1..=MAX_ALARM_DURATION_SECS).contains(&self.max_alarm_duration_secs) {
            return Err(QuakeError::config(format!(
                "max_alarm_duration_secs must be between 1 and {}",
                MAX_ALARM_DURATION_SECS
            )));
        }
        if !(1..=MAX_FETCH_TIMEOUT_SECS).contains(&self.fetch_timeout_secs) {
            return Err(QuakeError::config(format!(
                "fetch_timeout_secs must be between 1 and {}",
                MAX_FETCH_TIMEOUT_SECS
            )));
        }
        if self.feed_url.trim().is_empty() {
            return Err(QuakeError::config("feed_url is empty"));
        }

        Ok(())
    }

    /// Create the data directory. Failure here is fatal for the monitor.
    pub fn ensure_data_dir(&self) -> crate::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            QuakeError::config(format!(
                "cannot create data directory {:?}: {}",
                self.data_dir, e
            ))
        })
    }

    /// Update a single setting from its textual form.
    ///
    /// `self` is left untouched when the new value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        let mut updated = self.clone();
        updated.apply(key, value)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn apply(&mut self, key: &str, value: &str) -> crate::Result<()> {
        match key {
            "latitude" => self.location.latitude = parse_value(key, value)?,
            "longitude" => self.location.longitude = parse_value(key, value)?,
            "max_distance_km" => self.max_distance_km = parse_value(key, value)?,
            "evacuation_magnitude" => self.evacuation_magnitude = parse_value(key, value)?,
            "poll_interval_secs" => self.poll_interval_secs = parse_value(key, value)?,
            "alarm_sound" => self.alarm_sound = Some(PathBuf::from(value)),
            "max_alarm_duration_secs" => {
                self.max_alarm_duration_secs = parse_value(key, value)?
            }
            "feed_url" => self.feed_url = value.to_string(),
            "data_dir" => self.data_dir = PathBuf::from(value),
            "fetch_timeout_secs" => self.fetch_timeout_secs = parse_value(key, value)?,
            _ => {
                return Err(QuakeError::config(format!(
                    "unknown setting '{}' (expected one of: {})",
                    key,
                    CONFIG_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> crate::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| QuakeError::config(format!("invalid value '{}' for {}", value, key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.max_alarm_duration(), Duration::from_secs(120));
        assert_eq!(config.alarm_sound_path(), config.data_dir.join("alarm.mp3"));
    }

    #[test]
    fn test_roundtrip_through_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.set("max_distance_km", "150").unwrap();
        config.set("latitude", "-33.45").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.max_distance_km, 150.0);
    }

    #[test]
    fn test_missing_and_corrupt_files_fall_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"evacuation_magnitude": 6.0}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.evacuation_magnitude, 6.0);
        assert_eq!(loaded.max_distance_km, 300.0);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("latitude", "north").is_err());
        assert!(config.set("volume", "11").is_err());
        assert!(config.set("latitude", "91").is_err());
        assert!(config.set("poll_interval_secs", "0").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_durations_have_upper_bounds() {
        let mut config = Config::default();
        assert!(config
            .set("max_alarm_duration_secs", &u64::MAX.to_string())
            .is_err());
        assert!(config
            .set("max_alarm_duration_secs", &(MAX_ALARM_DURATION_SECS + 1).to_string())
            .is_err());
        assert!(config
            .set("max_alarm_duration_secs", &MAX_ALARM_DURATION_SECS.to_string())
            .is_ok());

        assert!(config.set("fetch_timeout_secs", "301").is_err());
        assert!(config.set("fetch_timeout_secs", "300").is_ok());
    }
}
