//! Monitor command handler.
//!
//! Wires the feed, the persistence files, the alarm and the keyboard together
//! and runs the poll loop until 'q', SIGINT or SIGTERM.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::core::{
    AlertController, AlertSettings, Config, EventLog, InputListener, JsonDedupStore, PollLoop,
    PollSettings, Sink, UsgsFeed,
};
use crate::logging::init_logging;
use crate::platform::{stdin_is_interactive, KeyboardInput, ProcessSink};
use crate::ui::console;

/// Arguments that override the saved configuration for one invocation
pub fn override_args() -> Vec<Arg> {
    vec![
        Arg::new("lat")
            .long("lat")
            .help("Observation latitude in degrees")
            .allow_negative_numbers(true)
            .value_parser(clap::value_parser!(f64)),
        Arg::new("lon")
            .long("lon")
            .help("Observation longitude in degrees")
            .allow_negative_numbers(true)
            .value_parser(clap::value_parser!(f64)),
        Arg::new("max-distance")
            .long("max-distance")
            .value_name("KM")
            .help("Only consider earthquakes within this distance")
            .value_parser(clap::value_parser!(f64)),
        Arg::new("threshold")
            .long("threshold")
            .value_name("MAGNITUDE")
            .help("Minimum magnitude that sounds the alarm")
            .value_parser(clap::value_parser!(f64)),
        Arg::new("interval")
            .long("interval")
            .value_name("SECONDS")
            .help("Seconds between feed checks")
            .value_parser(clap::value_parser!(u64)),
        Arg::new("sound")
            .long("sound")
            .value_name("FILE")
            .help("Sound file played while the alarm is active")
            .value_parser(clap::value_parser!(PathBuf)),
        Arg::new("max-alarm")
            .long("max-alarm")
            .value_name("SECONDS")
            .help("Stop the alarm automatically after this many seconds")
            .value_parser(clap::value_parser!(u64)),
        Arg::new("feed-url")
            .long("feed-url")
            .value_name("URL")
            .help("GeoJSON earthquake feed to poll"),
        Arg::new("data-dir")
            .long("data-dir")
            .value_name("DIR")
            .help("Directory for the event log and last-event record")
            .value_parser(clap::value_parser!(PathBuf)),
    ]
}

/// Load the saved configuration and apply command-line overrides
pub fn resolve_config(matches: &ArgMatches) -> Result<Config> {
    apply_overrides(Config::load()?, matches)
}

/// Apply the flags from [`override_args`] on top of `config` and validate the result
pub fn apply_overrides(mut config: Config, matches: &ArgMatches) -> Result<Config> {

    if let Some(&lat) = matches.get_one::<f64>("lat") {
        config.location.latitude = lat;
    }
    if let Some(&lon) = matches.get_one::<f64>("lon") {
        config.location.longitude = lon;
    }
    if let Some(&km) = matches.get_one::<f64>("max-distance") {
        config.max_distance_km = km;
    }
    if let Some(&magnitude) = matches.get_one::<f64>("threshold") {
        config.evacuation_magnitude = magnitude;
    }
    if let Some(&secs) = matches.get_one::<u64>("interval") {
        config.poll_interval_secs = secs;
    }
    if let Some(sound) = matches.get_one::<PathBuf>("sound") {
        config.alarm_sound = Some(sound.clone());
    }
    if let Some(&secs) = matches.get_one::<u64>("max-alarm") {
        config.max_alarm_duration_secs = secs;
    }
    if let Some(url) = matches.get_one::<String>("feed-url") {
        config.feed_url = url.clone();
    }
    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config.data_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Execute the run command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = resolve_config(matches)?;
    config.ensure_data_dir()?;
    init_logging(Some(&config.system_log_path()));

    monitor(config)
}

/// Forces the alarm off and raises the shutdown flag however `monitor` exits
struct ShutdownGuard<S: Sink> {
    controller: Arc<AlertController<S>>,
    shutdown: Arc<AtomicBool>,
}

impl<S: Sink> Drop for ShutdownGuard<S> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.controller.shutdown();
    }
}

/// Run the monitor until shutdown is requested
pub fn monitor(config: Config) -> Result<()> {
    let controller = Arc::new(AlertController::new(
        ProcessSink::new(),
        AlertSettings {
            sound_path: config.alarm_sound_path(),
            evacuation_magnitude: config.evacuation_magnitude,
            max_duration: config.max_alarm_duration(),
        },
    ));
    let shutdown = Arc::new(AtomicBool::new(false));
    let _guard = ShutdownGuard {
        controller: Arc::clone(&controller),
        shutdown: Arc::clone(&shutdown),
    };

    {
        let controller = Arc::clone(&controller);
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            log::info!("Termination signal received");
            shutdown.store(true, Ordering::SeqCst);
            controller.shutdown();
            console::shutting_down();
        })
        .context("Failed to set termination signal handler")?;
    }

    let feed = UsgsFeed::new(config.feed_url.clone(), config.fetch_timeout())
        .context("Failed to create HTTP client")?;
    let mut poll_loop = PollLoop::new(
        feed,
        JsonDedupStore::new(config.last_quake_path()),
        EventLog::new(config.event_log_path()),
        Arc::clone(&controller),
        Arc::clone(&shutdown),
        PollSettings::from(&config),
    );

    let watchdog = {
        let controller = Arc::clone(&controller);
        thread::Builder::new()
            .name("alarm-watchdog".into())
            .spawn(move || controller.run_watchdog())
            .context("Failed to start alarm watchdog")?
    };

    console::startup_banner(&config);
    log::info!(
        "Monitoring {} within {} km, alarm at M{}",
        config.location,
        config.max_distance_km,
        config.evacuation_magnitude
    );

    let keyboard = if stdin_is_interactive() {
        console::key_help();
        let listener = InputListener::new(Arc::clone(&controller), Arc::clone(&shutdown));
        let handle = thread::Builder::new()
            .name("keyboard".into())
            .spawn(move || match KeyboardInput::new() {
                Ok(mut input) => listener.run(&mut input),
                Err(e) => log::warn!("Keyboard commands unavailable: {}", e),
            })
            .context("Failed to start keyboard listener")?;
        Some(handle)
    } else {
        log::info!("stdin is not a terminal; keyboard commands disabled");
        None
    };

    poll_loop.run();

    shutdown.store(true, Ordering::SeqCst);
    controller.shutdown();

    if watchdog.join().is_err() {
        log::error!("Alarm watchdog panicked");
    }
    if let Some(handle) = keyboard {
        if handle.join().is_err() {
            log::error!("Keyboard listener panicked");
        }
    }

    console::stopped();
    log::info!("Earthquake alert system stopped");
    Ok(())
}
