//! Feed polling loop.
//!
//! Each cycle fetches the feed, picks the strongest nearby event and, when it
//! is one not seen before, records it and hands it to the alert controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::alert::{AlertController, Sink, TriggerOutcome};
use super::config::Config;
use super::feed::{EventRecord, FeedSource};
use super::filter::select_strongest;
use super::geo::Coordinate;
use super::store::{AlertRecord, DedupStore, EventLog};
use crate::error::{QuakeError, Result};
use crate::ui::console;

/// How often the loop wakes to look at the clock and the shutdown flag
pub const DEFAULT_WAKE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub origin: Coordinate,
    pub max_distance_km: f64,
    /// Time between the end of one evaluation and the start of the next
    pub interval: Duration,
    pub wake: Duration,
}

impl From<&Config> for PollSettings {
    fn from(config: &Config) -> Self {
        Self {
            origin: config.location,
            max_distance_km: config.max_distance_km,
            interval: config.poll_interval(),
            wake: DEFAULT_WAKE,
        }
    }
}

/// Result of one evaluation cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    FetchFailed,
    /// Shutdown was requested while the feed request was in flight
    Interrupted,
    /// The feed listed no events at all
    NoEvents,
    /// No event within the configured radius
    NoNearby,
    /// The strongest nearby event was already reported
    Duplicate(String),
    /// A new event was recorded. `trigger` is `None` when it was below the
    /// evacuation threshold.
    Reported {
        record: AlertRecord,
        trigger: Option<TriggerOutcome>,
    },
}

/// Feeds are fetched on a worker thread so a slow request never delays shutdown
pub struct PollLoop<F: FeedSource + Send + Sync + 'static, D: DedupStore, S: Sink> {
    feed: Arc<F>,
    store: D,
    event_log: EventLog,
    controller: Arc<AlertController<S>>,
    shutdown: Arc<AtomicBool>,
    settings: PollSettings,
    last_id: Option<String>,
}

impl<F: FeedSource + Send + Sync + 'static, D: DedupStore, S: Sink> PollLoop<F, D, S> {
    /// Build the loop, seeding deduplication from `store`
    pub fn new(
        feed: F,
        store: D,
        event_log: EventLog,
        controller: Arc<AlertController<S>>,
        shutdown: Arc<AtomicBool>,
        settings: PollSettings,
    ) -> Self {
        let last_id = store.load();
        if let Some(ref id) = last_id {
            log::info!("Last reported earthquake: {}", id);
        }

        Self {
            feed: Arc::new(feed),
            store,
            event_log,
            controller,
            shutdown,
            settings,
            last_id,
        }
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    pub fn controller(&self) -> &Arc<AlertController<S>> {
        &self.controller
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Evaluate immediately, then every `interval` until shutdown is requested
    pub fn run(&mut self) {
        if self.shutdown_requested() {
            return;
        }
        self.run_cycle();
        let mut last_check = Instant::now();

        while !self.shutdown_requested() {
            thread::sleep(self.settings.wake);
            if self.shutdown_requested() {
                break;
            }

            if last_check.elapsed() >= self.settings.interval {
                self.run_cycle();
                last_check = Instant::now();
            }
        }

        log::info!("Poll loop stopped");
    }

    /// Fetch on a worker and wait for it, giving up once shutdown is requested.
    ///
    /// Returns `None` when the request was abandoned.
    fn fetch(&self) -> Option<Result<Vec<EventRecord>>> {
        let (tx, rx) = mpsc::channel();
        let feed = Arc::clone(&self.feed);
        let spawned = thread::Builder::new()
            .name("feed-fetch".into())
            .spawn(move || {
                // The receiver is gone if the loop gave up on this request
                let _ = tx.send(feed.fetch());
            });
        if let Err(e) = spawned {
            return Some(Err(QuakeError::fetch(format!(
                "cannot start feed request: {}",
                e
            ))));
        }

        loop {
            match rx.recv_timeout(self.settings.wake) {
                Ok(result) => return Some(result),
                Err(RecvTimeoutError::Timeout) => {
                    if self.shutdown_requested() {
                        log::info!("Abandoning feed request on shutdown");
                        return None;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Some(Err(QuakeError::fetch("feed request ended without a result")))
                }
            }
        }
    }

    /// Run a single fetch-filter-report cycle
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let Some(fetched) = self.fetch() else {
            return CycleOutcome::Interrupted;
        };
        let records = match fetched {
            Ok(records) => records,
            Err(e) => {
                log::error!("Failed to fetch earthquake feed: {}", e);
                console::fetch_error(&e);
                return CycleOutcome::FetchFailed;
            }
        };

        if records.is_empty() {
            console::no_recent_events();
            return CycleOutcome::NoEvents;
        }

        let Some(strongest) = select_strongest(
            &records,
            &self.settings.origin,
            self.settings.max_distance_km,
        ) else {
            console::no_nearby_events();
            return CycleOutcome::NoNearby;
        };

        if self.last_id.as_deref() == Some(strongest.id()) {
            log::debug!("Strongest nearby event {} already reported", strongest.id());
            return CycleOutcome::Duplicate(strongest.id().to_string());
        }

        let record = AlertRecord::from(&strongest);
        self.last_id = Some(record.id.clone());
        self.store.save(&record);
        self.event_log.append(&record);

        log::info!(
            "New nearby earthquake {}: M{} {} ({:.2} km)",
            record.id,
            record.magnitude,
            record.place,
            record.distance
        );
        console::event_report(&record);

        let trigger = if self.controller.meets_threshold(record.magnitude) {
            Some(self.controller.trigger(&strongest))
        } else {
            console::below_threshold();
            None
        };

        CycleOutcome::Reported { record, trigger }
    }
}
