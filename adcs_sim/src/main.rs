use std::{error::Error, path::PathBuf};

use adcs::{AdcsApp, AdcsConfig, HealthReport};
use adcs_result::{AdcsResult, CoordinatorLog, ResultManager};
use clap::{Parser, Subcommand};
use scenario::Scenario;
use tracing_subscriber::EnvFilter;
use transport::BusTransport;

mod scenario;
mod transport;

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Replays recorded sensor frames through the ADCS flight software",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a scenario file through the flight coordinator
    Run {
        /// Scenario file (.ron)
        #[arg(short, long)]
        scenario: PathBuf,
        /// Coordinator config (.ron), defaults are used if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory for the csv results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the default coordinator config
    Config {
        /// Destination file, printed to stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            config,
            output,
        } => {
            let scenario = Scenario::load(&scenario)?;
            let config = match config {
                Some(path) => AdcsConfig::load(&path)?,
                None => AdcsConfig::default(),
            };
            let health = replay(&scenario, config, output)?;
            println!("{health}");
        }
        Commands::Config { output } => {
            let config = AdcsConfig::default();
            match output {
                Some(path) => {
                    config.save(&path)?;
                    tracing::info!(path = %path.display(), "default config written");
                }
                None => println!("{}", config.to_ron_string()?),
            }
        }
    }
    Ok(())
}

fn replay(
    scenario: &Scenario,
    config: AdcsConfig,
    output: Option<PathBuf>,
) -> Result<HealthReport, Box<dyn Error>> {
    let mut bus = BusTransport::new();
    for sample in scenario.samples() {
        bus.publish(&sample)?;
    }

    let mut app = AdcsApp::init(config, bus)?;
    if let Some(threshold) = scenario.fault_threshold {
        app.coordinator_mut().set_fault_threshold(threshold)?;
    }

    let mut results = output.map(ResultManager::new);
    let mut log = CoordinatorLog::new();
    if let Some(results) = &mut results {
        log.new_result(results)?;
    }

    let mut frame = 0;
    loop {
        for command in scenario.mode_commands_at(frame) {
            // a rejected request keeps the current mode, the replay carries on
            if let Err(e) = app.coordinator_mut().command_mode(command.mode) {
                tracing::warn!(frame, "{e}");
            }
        }
        if !app.step()? {
            break;
        }
        if let Some(results) = &mut results {
            log.write_result(app.coordinator(), results)?;
        }
        frame += 1;
    }

    if let Some(results) = &mut results {
        results.flush()?;
        tracing::info!(path = %results.result_path.display(), "results written");
    }

    let (bus, health) = app.shutdown();
    tracing::info!(frames = frame, commands = bus.sent_commands()?.len(), "replay complete");
    Ok(health)
}
