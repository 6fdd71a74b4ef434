use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod cli;
mod core;
mod daemon;
mod service;
mod sink;

use crate::core::settings::{LoggingSettings, Settings};

#[derive(Parser)]
#[command(name = "aforo-poller")]
#[command(author, version, about = "Polls Termaria facility occupancy and writes it to InfluxDB")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the occupancy service and write to InfluxDB until it can no longer make progress
    Run {
        /// Path to the config file (default: <config dir>/aforo-poller/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Authenticate, poll once and print the resulting points without writing them
    Check {
        /// Path to the config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if logging.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let journald_layer = if logging.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer),
            Err(e) => {
                eprintln!("journald logging unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(journald_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let (settings, source) = Settings::load(config.as_deref())?;
            init_logging(&settings.logging);
            source.log();

            let report = match daemon::run(settings).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %format!("{:#}", e), "Failed to start poller");
                    std::process::exit(daemon::EXIT_STATUS);
                }
            };

            tracing::error!(
                termination = %report.termination,
                sessions = report.sessions,
                "Poller stopped"
            );
            std::process::exit(report.exit_status());
        }
        Commands::Check { config, json } => {
            let (settings, source) = Settings::load(config.as_deref())?;
            init_logging(&settings.logging);
            source.log();
            cli::check::run(&settings, json).await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}
