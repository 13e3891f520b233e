use crate::core::config::CONFIG_KEYS;
use crate::core::Config;
use crate::ui;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn handle_config(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(),
        Some(("set", sub_matches)) => set(sub_matches),
        Some(("reset", sub_matches)) => reset(sub_matches),
        Some(("path", _)) => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
        _ => {
            println!("Use 'quakewatch config --help' for more information.");
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let config = Config::load()?;
    let path = Config::get_config_path()?;

    println!("{}", "Current configuration".cyan().bold());
    println!("{}", format!("({})", path.display()).dimmed());
    println!();
    println!("  {:<26}{}", "latitude", config.location.latitude);
    println!("  {:<26}{}", "longitude", config.location.longitude);
    println!("  {:<26}{}", "max_distance_km", config.max_distance_km);
    println!("  {:<26}{}", "evacuation_magnitude", config.evacuation_magnitude);
    println!("  {:<26}{}", "poll_interval_secs", config.poll_interval_secs);
    println!(
        "  {:<26}{}",
        "alarm_sound",
        config.alarm_sound_path().display()
    );
    println!(
        "  {:<26}{}",
        "max_alarm_duration_secs", config.max_alarm_duration_secs
    );
    println!("  {:<26}{}", "feed_url", config.feed_url);
    println!("  {:<26}{}", "data_dir", config.data_dir.display());
    println!("  {:<26}{}", "fetch_timeout_secs", config.fetch_timeout_secs);

    Ok(())
}

fn set(matches: &clap::ArgMatches) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .context("Key argument is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    let mut config = Config::load()?;
    if let Err(e) = config.set(key, value) {
        ui::error(&e.to_string());
        ui::dimmed(&format!("Valid keys: {}", CONFIG_KEYS.join(", ")));
        return Err(e.into());
    }
    config.save()?;

    ui::success(&format!("✓ {} set to {}", key, value));
    Ok(())
}

fn reset(matches: &clap::ArgMatches) -> Result<()> {
    if !matches.get_flag("yes")
        && !ui::prompts::confirm("Reset all settings to their defaults? [y/N]")?
    {
        ui::info("Cancelled.");
        return Ok(());
    }

    Config::default().save()?;
    ui::success("✓ Configuration reset to defaults");
    Ok(())
}
