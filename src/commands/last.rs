use anyhow::{Context, Result};
use colored::Colorize;

use crate::core::{Config, JsonDedupStore};
use crate::ui::{self, console};

/// Show the last reported earthquake
pub fn execute() -> Result<()> {
    let config = Config::load()?;
    let store = JsonDedupStore::new(config.last_quake_path());

    let record = store
        .read_record()
        .with_context(|| format!("Failed to read {:?}", store.path()))?;

    match record {
        Some(record) => {
            println!("{}", "Last reported earthquake".cyan().bold());
            console::print_record(&record);
            println!();
            ui::dimmed(&format!(
                "Full history: {}",
                config.event_log_path().display()
            ));
        }
        None => ui::info("No earthquake has been reported yet."),
    }

    Ok(())
}
