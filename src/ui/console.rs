// Console output for the monitor

use chrono::Local;
use colored::Colorize;

use crate::core::alert::StopReason;
use crate::core::filter::EvaluatedEvent;
use crate::core::store::AlertRecord;
use crate::core::Config;
use crate::error::QuakeError;

fn clock() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Startup summary of what is being watched
pub fn startup_banner(config: &Config) {
    println!("{}", "=== EARTHQUAKE ALERT SYSTEM STARTED ===".cyan().bold());
    println!("Monitoring earthquakes near: {}", config.location);
    println!("Maximum monitoring distance: {} km", config.max_distance_km);
    println!(
        "Minimum magnitude for evacuation: {}",
        config.evacuation_magnitude
    );
    println!("Check interval: {} seconds", config.poll_interval_secs);
    println!("{}", format!("Data directory: {}", config.data_dir.display()).dimmed());
    println!("{}", "=".repeat(51).cyan());
    println!();
}

pub fn key_help() {
    println!(
        "{}",
        "Press 'a' to acknowledge and silence an active alarm, or 'q' to quit".dimmed()
    );
}

pub fn no_recent_events() {
    println!("{}", format!("[{}] No recent earthquakes to report.", clock()).dimmed());
}

pub fn no_nearby_events() {
    println!(
        "{}",
        format!("[{}] No earthquakes near your location.", clock()).dimmed()
    );
}

pub fn fetch_error(err: &QuakeError) {
    println!("{}", format!("Connection error: {}", err).red());
}

/// Details of a newly detected nearby event
pub fn event_report(record: &AlertRecord) {
    println!();
    println!("{}", "=== EARTHQUAKE DETECTED ===".yellow().bold());
    print_record(record);
}

pub fn print_record(record: &AlertRecord) {
    println!("ID: {}", record.id);
    println!("Location: {}", record.place);
    println!("Magnitude: {}", record.magnitude.to_string().bold());
    println!("Depth: {} km", record.depth);
    println!("Time: {}", record.time);
    println!("Distance: {:.2} km", record.distance);
}

pub fn below_threshold() {
    println!(
        "{}",
        "This earthquake does not require immediate evacuation, but stay alert.".yellow()
    );
}

pub fn alert_banner(event: &EvaluatedEvent) {
    println!();
    println!(
        "{}",
        "ALERT! SIGNIFICANT EARTHQUAKE DETECTED! CONSIDER EVACUATING."
            .red()
            .bold()
    );
    println!(
        "{}",
        format!(
            "M{} {} ({:.1} km away)",
            event.magnitude(),
            event.record.place,
            event.distance_km
        )
        .red()
    );
    println!("{}", "Press 'a' to acknowledge and silence the alarm.".white().bold());
}

pub fn alarm_stopped(reason: StopReason) {
    println!();
    println!("{}", format!("Alarm stopped ({}).", reason).green());
}

pub fn shutting_down() {
    println!();
    println!("{}", "Shutting down earthquake alert system...".cyan());
}

pub fn stopped() {
    println!("{}", "Earthquake alert system stopped.".cyan().bold());
}
