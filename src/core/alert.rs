//! Alarm lifecycle.
//!
//! [`AlertController`] owns the single alarm channel. Every transition goes
//! through one mutex, so concurrent triggers, acknowledgments and deadline
//! expiry can never start two sinks or stop one twice.
//!
//! ```text
//!            trigger (mag >= threshold)
//!   Idle ─────────────────────────────► Active ──┐ trigger: no-op
//!    ▲                                     │  ◄───┘
//!    │                acknowledge / deadline / shutdown
//!    │                                     ▼
//!    └──────────────────────────────── Stopping
//!                 sink stopped
//! ```
//!
//! `Stopping` covers the window in which the sink is torn down outside the
//! lock. Triggers and acknowledgments that observe it are no-ops.

use parking_lot::{Condvar, Mutex};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::config::MAX_ALARM_DURATION_SECS;
use super::filter::EvaluatedEvent;
use crate::error::Result;
use crate::ui::console;

/// Idle re-check period of the deadline watchdog
const WATCHDOG_IDLE_TICK: Duration = Duration::from_millis(250);

/// The audible alarm: something that can be started on a sound file and
/// stopped again.
pub trait Sink: Send + Sync {
    type Handle: Send;

    fn start(&self, sound: &Path) -> Result<Self::Handle>;
    fn stop(&self, handle: Self::Handle) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Idle,
    Active,
    Stopping,
}

/// What a call to [`AlertController::trigger`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    BelowThreshold,
    AlreadyActive,
    /// A previous alarm is still being torn down
    Busy,
    SinkFailed,
    /// The controller has been shut down
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Acknowledged,
    Expired,
    Shutdown,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            StopReason::Acknowledged => "acknowledged",
            StopReason::Expired => "maximum duration reached",
            StopReason::Shutdown => "shutting down",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub sound_path: PathBuf,
    pub evacuation_magnitude: f64,
    pub max_duration: Duration,
}

struct Inner<H> {
    state: AlertState,
    handle: Option<H>,
    deadline: Option<Instant>,
    event_id: Option<String>,
    closed: bool,
}

pub struct AlertController<S: Sink> {
    sink: S,
    settings: AlertSettings,
    inner: Mutex<Inner<S::Handle>>,
    wake: Condvar,
}

impl<S: Sink> AlertController<S> {
    pub fn new(sink: S, mut settings: AlertSettings) -> Self {
        let longest = Duration::from_secs(MAX_ALARM_DURATION_SECS);
        if settings.max_duration > longest {
            log::warn!(
                "Maximum alarm duration {:?} capped to {:?}",
                settings.max_duration,
                longest
            );
            settings.max_duration = longest;
        }

        Self {
            sink,
            settings,
            inner: Mutex::new(Inner {
                state: AlertState::Idle,
                handle: None,
                deadline: None,
                event_id: None,
                closed: false,
            }),
            wake: Condvar::new(),
        }
    }

    pub fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn state(&self) -> AlertState {
        self.inner.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == AlertState::Active
    }

    /// When the running alarm stops on its own, if one is running
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.lock().deadline
    }

    /// Identifier of the event the running alarm was raised for
    pub fn active_event(&self) -> Option<String> {
        self.inner.lock().event_id.clone()
    }

    pub fn meets_threshold(&self, magnitude: f64) -> bool {
        magnitude >= self.settings.evacuation_magnitude
    }

    /// Sound the alarm for `event` if it is strong enough and no alarm is
    /// already running.
    pub fn trigger(&self, event: &EvaluatedEvent) -> TriggerOutcome {
        if !self.meets_threshold(event.magnitude()) {
            return TriggerOutcome::BelowThreshold;
        }

        let mut inner = self.inner.lock();
        if inner.closed {
            return TriggerOutcome::Closed;
        }
        match inner.state {
            AlertState::Active => {
                log::debug!(
                    "Alarm already active for {:?}, ignoring {}",
                    inner.event_id,
                    event.id()
                );
                return TriggerOutcome::AlreadyActive;
            }
            AlertState::Stopping => return TriggerOutcome::Busy,
            AlertState::Idle => {}
        }

        // Deadline is known before anything audible starts
        let Some(deadline) = Instant::now().checked_add(self.settings.max_duration) else {
            log::error!(
                "Cannot schedule an alarm lasting {:?}",
                self.settings.max_duration
            );
            return TriggerOutcome::SinkFailed;
        };

        // Started under the lock so no second caller can slip in
        let handle = match self.sink.start(&self.settings.sound_path) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Failed to play alarm: {}", e);
                return TriggerOutcome::SinkFailed;
            }
        };

        inner.state = AlertState::Active;
        inner.handle = Some(handle);
        inner.deadline = Some(deadline);
        inner.event_id = Some(event.id().to_string());
        drop(inner);
        self.wake.notify_all();

        log::warn!(
            "ALERT! Significant earthquake detected: M{} {} ({:.1} km). Consider evacuating.",
            event.magnitude(),
            event.record.place,
            event.distance_km
        );
        console::alert_banner(event);

        TriggerOutcome::Started
    }

    /// Stop the running alarm on user request. No-op when nothing is running.
    pub fn acknowledge(&self) -> bool {
        self.stop(StopReason::Acknowledged)
    }

    /// Stop the running alarm if its deadline is at or before `now`
    pub fn expire_if_due(&self, now: Instant) -> bool {
        let handle = {
            let mut inner = self.inner.lock();
            let deadline = inner.deadline;
            match deadline {
                Some(deadline) if inner.state == AlertState::Active && now >= deadline => {
                    Self::begin_stop(&mut inner)
                }
                _ => return false,
            }
        };
        self.finish_stop(handle, StopReason::Expired);
        true
    }

    /// Stop any running alarm and refuse new ones. Also releases the watchdog.
    pub fn shutdown(&self) {
        self.inner.lock().closed = true;
        self.wake.notify_all();
        self.stop(StopReason::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Enforce the maximum alarm duration until [`shutdown`](Self::shutdown).
    ///
    /// Blocks the calling thread; run it on a dedicated one.
    pub fn run_watchdog(&self) {
        let mut inner = self.inner.lock();
        loop {
            if inner.closed {
                break;
            }
            let deadline = inner.deadline;
            match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    drop(inner);
                    self.expire_if_due(Instant::now());
                    inner = self.inner.lock();
                }
                Some(deadline) => {
                    self.wake.wait_until(&mut inner, deadline);
                }
                None => {
                    self.wake.wait_for(&mut inner, WATCHDOG_IDLE_TICK);
                }
            }
        }
        log::debug!("Alarm watchdog exiting");
    }

    fn stop(&self, reason: StopReason) -> bool {
        let handle = {
            let mut inner = self.inner.lock();
            if inner.state != AlertState::Active {
                return false;
            }
            Self::begin_stop(&mut inner)
        };
        self.finish_stop(handle, reason);
        true
    }

    fn begin_stop(inner: &mut Inner<S::Handle>) -> Option<S::Handle> {
        inner.state = AlertState::Stopping;
        inner.deadline = None;
        inner.handle.take()
    }

    fn finish_stop(&self, handle: Option<S::Handle>, reason: StopReason) {
        self.wake.notify_all();

        if let Some(handle) = handle {
            if let Err(e) = self.sink.stop(handle) {
                log::error!("Error while stopping alarm: {}", e);
            }
        }

        {
            let mut inner = self.inner.lock();
            inner.state = AlertState::Idle;
            inner.event_id = None;
        }

        log::info!("Alarm stopped ({})", reason);
        console::alarm_stopped(reason);
    }
}

impl<S: Sink> Drop for AlertController<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
