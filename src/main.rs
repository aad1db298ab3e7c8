use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use crossbeam_channel::{bounded, select, unbounded};

use sysbridge::core::config::Settings;
use sysbridge::{DataUpdate, ModuleName, ModuleSet, ModulesData};

fn main() -> Result<()> {
    sysbridge::init_logging();

    let matches = Command::new("sysbridge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collects system telemetry in the background and reports every change")
        .arg(
            Arg::new("data-interval")
                .long("data-interval")
                .value_name("SECONDS")
                .help("Seconds between two data updates")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("media-interval")
                .long("media-interval")
                .value_name("SECONDS")
                .help("Seconds between two media updates while nothing plays")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("modules")
                .short('m')
                .long("modules")
                .value_name("NAMES")
                .help("Comma separated modules to refresh right after the first update (e.g. cpu,gpus)"),
        )
        .arg(
            Arg::new("no-media")
                .long("no-media")
                .help("Do not start the media schedule")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print each updated field as JSON")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or reset the settings file")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print the effective settings"))
                .subcommand(Command::new("path").about("Print the settings file location"))
                .subcommand(Command::new("reset").about("Write the default settings")),
        )
        .subcommand(Command::new("modules").about("List the module names"))
        .get_matches();

    match matches.subcommand() {
        Some(("config", sub)) => handle_config(sub),
        Some(("modules", _)) => {
            for name in ModuleName::ALL {
                println!("{}", name);
            }
            Ok(())
        }
        _ => run(&matches),
    }
}

fn handle_config(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => {
            let settings = Settings::load()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Some(("path", _)) => {
            println!("{}", Settings::get_config_path()?.display());
        }
        Some(("reset", _)) => {
            Settings::default().save()?;
            println!("Settings reset to defaults");
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}

fn parse_modules(value: &str) -> Result<Vec<ModuleName>> {
    value
        .split(',')
        .filter(|name| !name.trim().is_empty())
        .map(|name| name.parse::<ModuleName>().map_err(anyhow::Error::from))
        .collect()
}

fn run(matches: &ArgMatches) -> Result<()> {
    let mut settings = Settings::load()?;
    if let Some(secs) = matches.get_one::<u64>("data-interval") {
        settings.data_interval_ms = secs * 1000;
    }
    if let Some(secs) = matches.get_one::<u64>("media-interval") {
        settings.media_idle_interval_ms = secs * 1000;
    }
    let modules = matches
        .get_one::<String>("modules")
        .map(|value| parse_modules(value))
        .transpose()?;
    let json = matches.get_flag("json");

    let (updates_tx, updates_rx) = unbounded::<ModuleName>();
    let update = DataUpdate::new(&settings, ModuleSet::system_defaults(), move |name| {
        let updates_tx = updates_tx.clone();
        async move {
            let _ = updates_tx.send(name);
        }
    })
    .context("Failed to start data update")?;

    let (stop_tx, stop_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("Failed to set Ctrl-C handler")?;

    update.request_update(modules)?;
    if !matches.get_flag("no-media") {
        update.request_media_update()?;
    }

    let data = update.data();
    loop {
        select! {
            recv(updates_rx) -> name => match name {
                Ok(name) => print_update(&data, name, json),
                Err(_) => break,
            },
            recv(stop_rx) -> _ => break,
        }
    }

    update.shutdown(settings.shutdown_timeout());
    Ok(())
}

fn print_update(data: &ModulesData, name: ModuleName, json: bool) {
    if !json {
        println!("[{}] {} updated", chrono::Local::now().format("%H:%M:%S"), name);
        return;
    }

    let value = data.get_json(name).unwrap_or(serde_json::Value::Null);
    let line = serde_json::json!({ "module": name, "data": value });
    println!("{}", line);
}
