use quakewatch::core::config::DEFAULT_FEED_URL;
use quakewatch::core::{Config, Coordinate, PollSettings};
use quakewatch::QuakeError;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.location, Coordinate::new(4.6097, -74.0817));
    assert_eq!(config.max_distance_km, 300.0);
    assert_eq!(config.evacuation_magnitude, 4.5);
    assert_eq!(config.poll_interval_secs, 10);
    assert_eq!(config.max_alarm_duration_secs, 120);
    assert_eq!(config.fetch_timeout_secs, 10);
    assert_eq!(config.feed_url, DEFAULT_FEED_URL);
}

#[test]
fn test_data_files_live_in_data_dir() {
    let temp = TempDir::new().unwrap();
    let config = Config {
        data_dir: temp.path().join("data"),
        ..Default::default()
    };

    assert_eq!(config.last_quake_path(), temp.path().join("data/last_quake.json"));
    assert_eq!(config.event_log_path(), temp.path().join("data/earthquake_log.txt"));
    assert_eq!(config.system_log_path(), temp.path().join("data/system.log"));
}

#[test]
fn test_ensure_data_dir_creates_directory() {
    let temp = TempDir::new().unwrap();
    let config = Config {
        data_dir: temp.path().join("a").join("b"),
        ..Default::default()
    };

    config.ensure_data_dir().unwrap();
    assert!(config.data_dir.is_dir());
    // Idempotent
    config.ensure_data_dir().unwrap();
}

#[test]
fn test_unusable_data_dir_is_config_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("occupied");
    std::fs::write(&file, "").unwrap();

    let config = Config {
        data_dir: file.join("data"),
        ..Default::default()
    };

    let err = config.ensure_data_dir().unwrap_err();
    assert!(matches!(err, QuakeError::Config(_)));
}

#[test]
fn test_poll_settings_from_config() {
    let mut config = Config::default();
    config.set("poll_interval_secs", "30").unwrap();
    config.set("longitude", "-70.66").unwrap();

    let settings = PollSettings::from(&config);
    assert_eq!(settings.interval, Duration::from_secs(30));
    assert_eq!(settings.origin.longitude, -70.66);
    assert_eq!(settings.max_distance_km, 300.0);
    assert!(settings.wake <= Duration::from_secs(1));
}

#[test]
fn test_custom_alarm_sound_overrides_default() {
    let mut config = Config::default();
    config.set("alarm_sound", "/usr/share/sounds/siren.mp3").unwrap();
    assert_eq!(
        config.alarm_sound_path(),
        std::path::PathBuf::from("/usr/share/sounds/siren.mp3")
    );
}
