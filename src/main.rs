mod cli;
mod logging;
mod progress_bar;

use std::io::{self, Write};
use std::path::Path;
use std::process;
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, ScanArgs};
use colored::*;
use dotenv::dotenv;
use dupe_ledger::{AppConfig, Registry, ScanEngine};
use progress_bar::CliReporter;
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = AppConfig::load().context("Error loading configuration")?;

    match args.command {
        Some(Commands::Scan(scan_args)) => {
            if let Err(err) = run_scan(config, &scan_args) {
                error!("Error: {:#}", err);
            }
        }
        None => {
            if let Err(err) = run_scan(config, &ScanArgs::default()) {
                error!("Error: {:#}", err);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
        }
        Some(Commands::CountRegistry) => {
            let registry = Registry::load(&config.database_path);
            info!(
                "Total entries in registry {}: {}",
                config.database_path,
                registry.len()
            );
        }
        Some(Commands::ClearRegistry) => {
            match prompt_confirm(
                &format!(
                    "Are you SURE you want to DELETE the registry at {}?",
                    config.database_path
                ),
                Some(false),
            ) {
                Ok(true) => match Registry::clear(Path::new(&config.database_path)) {
                    Ok(true) => println!("Registry deleted"),
                    Ok(false) => println!("No registry to delete"),
                    Err(e) => error!("Error deleting registry: {}", e),
                },
                _ => {
                    process::exit(0);
                }
            }
        }
    }

    Ok(())
}

fn run_scan(mut config: AppConfig, args: &ScanArgs) -> anyhow::Result<()> {
    if let Some(directory) = &args.directory {
        config.directory = directory.clone();
    }
    if let Some(threads) = args.threads {
        config.worker_threads = threads;
    }

    let engine = ScanEngine::new(config);

    let shutdown_flag = engine.shutdown_flag();
    ctrlc::set_handler(move || {
        if shutdown_flag.swap(true, Ordering::SeqCst) {
            eprintln!("\nForce shutdown requested. Exiting immediately...");
            process::exit(1);
        }
        eprintln!(
            "\nGraceful shutdown requested. Finishing in-flight files... (Press Ctrl+C again to force quit)"
        );
    })
    .context("Failed to set Ctrl+C handler")?;

    let reporter = CliReporter::new();
    let result = engine.scan(&reporter)?;

    println!();
    if result.duplicates.is_empty() {
        info!("No duplicate files found.");
    } else {
        info!("Duplicate files found:");
        for record in &result.duplicates {
            info!("{}", record);
        }
    }

    info!(
        "Scan: {}, Persist: {}",
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.persist_duration.as_secs_f64()).green(),
    );
    info!(
        "{} files processed: {} new, {} already registered, {} failed",
        format!("{}", result.files_seen).cyan(),
        format!("{}", result.files_novel).cyan(),
        format!("{}", result.files_known).cyan(),
        format!("{}", result.files_failed).red(),
    );
    info!(
        "{} duplicates this run, {} registry entries",
        format!("{}", result.duplicates.len()).red(),
        format!("{}", result.registry_entries).cyan(),
    );

    if result.log_failures > 0 {
        warn!(
            "{} duplicates could not be written to {}",
            result.log_failures,
            engine.config().duplicates_log_path
        );
    }
    if let Some(e) = &result.persist_error {
        error!("Registry was not saved: {}", e);
    }
    if result.interrupted {
        warn!("Emergency stop triggered. Exiting the program...");
    }

    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
