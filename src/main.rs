use anyhow::Result;
use clap::{Arg, Command};

use quakewatch::commands;
use quakewatch::logging::init_logging;

fn cli() -> Command {
    Command::new("quakewatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sounds an alarm when a strong earthquake strikes near you")
        .long_about(
            "Polls a seismic event feed and sounds an alarm when the strongest recent \
             earthquake near your location reaches the evacuation magnitude.\n\n\
             Running without a subcommand starts the monitor.",
        )
        .args(commands::run::override_args())
        .subcommand(
            Command::new("run")
                .about("Start monitoring (default)")
                .args(commands::run::override_args()),
        )
        .subcommand(
            Command::new("check")
                .about("Fetch the feed once and show what the monitor would do")
                .args(commands::run::override_args()),
        )
        .subcommand(Command::new("last").about("Show the last reported earthquake"))
        .subcommand(
            Command::new("config")
                .about("Manage saved settings (use 'quakewatch config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Show the current settings"))
                .subcommand(
                    Command::new("set")
                        .about("Change a setting")
                        .arg(
                            Arg::new("key")
                                .help("Setting name, e.g. latitude or evacuation_magnitude")
                                .required(true)
                                .index(1),
                        )
                        .arg(
                            Arg::new("value")
                                .help("New value")
                                .required(true)
                                .allow_negative_numbers(true)
                                .index(2),
                        ),
                )
                .subcommand(
                    Command::new("reset").about("Restore default settings").arg(
                        Arg::new("yes")
                            .short('y')
                            .long("yes")
                            .help("Do not ask for confirmation")
                            .action(clap::ArgAction::SetTrue),
                    ),
                )
                .subcommand(Command::new("path").about("Print the settings file location")),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("run", sub_matches)) => commands::run(sub_matches)?,
        Some(("check", sub_matches)) => commands::check(sub_matches)?,
        Some(("last", _)) => {
            init_logging(None);
            commands::last()?;
        }
        Some(("config", sub_matches)) => {
            init_logging(None);
            commands::config::handle_config(sub_matches)?;
        }
        Some(("version", _)) => commands::version()?,
        _ => commands::run(&matches)?,
    }

    Ok(())
}
