//! One-shot feed check.
//!
//! Fetches the feed once and shows what the monitor would do with it, without
//! sounding the alarm or touching the stored last event.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use super::run::resolve_config;
use crate::core::{
    nearby_events, AlertRecord, Config, DedupStore, FeedSource, JsonDedupStore, UsgsFeed,
};
use crate::logging::init_logging;
use crate::ui::{self, console};

/// What the monitor would do with the current feed
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    NoNearby,
    AlreadyReported(String),
    WouldAlarm(String),
    BelowThreshold(String),
}

/// Execute the check command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    init_logging(None);
    let config = resolve_config(matches)?;

    let feed = UsgsFeed::new(config.feed_url.clone(), config.fetch_timeout())
        .context("Failed to create HTTP client")?;

    ui::dimmed(&format!("Fetching {}", feed.url()));
    evaluate(&config, &feed)?;
    Ok(())
}

/// Fetch once from `feed` and print the verdict. Reads the stored last event
/// but never writes to the data directory.
pub fn evaluate<F: FeedSource>(config: &Config, feed: &F) -> Result<Verdict> {
    let records = feed.fetch().context("Failed to fetch earthquake feed")?;

    let mut nearby = nearby_events(&records, &config.location, config.max_distance_km);
    ui::info(&format!(
        "{} earthquakes in feed, {} within {} km of {}",
        records.len(),
        nearby.len(),
        config.max_distance_km,
        config.location
    ));

    if nearby.is_empty() {
        console::no_nearby_events();
        return Ok(Verdict::NoNearby);
    }

    // Strongest first; the stable sort keeps feed order among equal magnitudes
    nearby.sort_by(|a, b| b.magnitude().total_cmp(&a.magnitude()));

    println!();
    for event in &nearby {
        let line = format!(
            "  M{:<4} {:>8.1} km  {:<14} {}",
            event.magnitude(),
            event.distance_km,
            event.id(),
            event.record.place
        );
        if event.magnitude() >= config.evacuation_magnitude {
            println!("{}", line.red().bold());
        } else {
            println!("{}", line);
        }
    }
    println!();

    let strongest = &nearby[0];
    let record = AlertRecord::from(strongest);
    console::print_record(&record);
    println!();

    let store = JsonDedupStore::new(config.last_quake_path());
    if store.load().as_deref() == Some(strongest.id()) {
        ui::dimmed("This earthquake has already been reported; the monitor will not alert on it again.");
        return Ok(Verdict::AlreadyReported(record.id));
    }

    if strongest.magnitude() >= config.evacuation_magnitude {
        ui::warn(&format!(
            "M{} meets the evacuation threshold of M{}; the monitor would sound the alarm.",
            strongest.magnitude(),
            config.evacuation_magnitude
        ));
        Ok(Verdict::WouldAlarm(record.id))
    } else {
        console::below_threshold();
        Ok(Verdict::BelowThreshold(record.id))
    }
}
