// Shared fakes for the integration tests
#![allow(dead_code)]

use parking_lot::Mutex;
use quakewatch::core::{
    AlertController, AlertSettings, Coordinate, EventLog, EventRecord, FeedSource,
    JsonDedupStore, PollLoop, PollSettings, Sink,
};
use quakewatch::core::geo::EARTH_RADIUS_KM;
use quakewatch::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const ORIGIN: Coordinate = Coordinate::new(4.6097, -74.0817);

/// Feed that returns the same events on every fetch
pub struct StaticFeed(pub Vec<EventRecord>);

impl FeedSource for StaticFeed {
    fn fetch(&self) -> Result<Vec<EventRecord>> {
        Ok(self.0.clone())
    }
}

/// Feed whose contents can be swapped between cycles
#[derive(Clone, Default)]
pub struct SharedFeed(pub Arc<Mutex<Vec<EventRecord>>>);

impl SharedFeed {
    pub fn set(&self, records: Vec<EventRecord>) {
        *self.0.lock() = records;
    }
}

impl FeedSource for SharedFeed {
    fn fetch(&self) -> Result<Vec<EventRecord>> {
        Ok(self.0.lock().clone())
    }
}

#[derive(Default)]
pub struct CountingSink {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl Sink for CountingSink {
    type Handle = ();

    fn start(&self, _sound: &Path) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self, _handle: ()) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An event `km_north` kilometers due north of [`ORIGIN`]
pub fn quake_north(id: &str, magnitude: f64, km_north: f64) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        magnitude,
        depth_km: 25.0,
        place: format!("{} km N of Bogotá, Colombia", km_north),
        time_ms: 1_760_000_000_000,
        coordinate: Coordinate::new(
            ORIGIN.latitude + (km_north / EARTH_RADIUS_KM).to_degrees(),
            ORIGIN.longitude,
        ),
    }
}

pub fn controller(threshold: f64) -> Arc<AlertController<CountingSink>> {
    Arc::new(AlertController::new(
        CountingSink::default(),
        AlertSettings {
            sound_path: PathBuf::from("alarm.mp3"),
            evacuation_magnitude: threshold,
            max_duration: Duration::from_secs(120),
        },
    ))
}

pub fn poll_loop<F: FeedSource + Send + Sync + 'static>(
    data_dir: &Path,
    feed: F,
    controller: Arc<AlertController<CountingSink>>,
    max_distance_km: f64,
) -> PollLoop<F, JsonDedupStore, CountingSink> {
    PollLoop::new(
        feed,
        JsonDedupStore::new(data_dir.join("last_quake.json")),
        EventLog::new(data_dir.join("earthquake_log.txt")),
        controller,
        Arc::new(AtomicBool::new(false)),
        PollSettings {
            origin: ORIGIN,
            max_distance_km,
            interval: Duration::from_secs(10),
            wake: Duration::from_millis(10),
        },
    )
}
