//! # Preflight CLI
//!
//! Command-line entry point for the Preflight checklist service.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "preflight")]
#[command(author = "Daemoniorum Engineering")]
#[command(version)]
#[command(about = "Checklist API server", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the checklist API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// File holding the checklists
        #[arg(short, long)]
        data_file: Option<PathBuf>,

        /// Disable cross-origin headers
        #[arg(long)]
        no_cors: bool,

        /// Answer 500 when the data file cannot be written
        #[arg(long)]
        strict_persistence: bool,

        /// Keep checklists in memory only
        #[arg(long, conflicts_with = "data_file")]
        ephemeral: bool,
    },

    /// Display version and build info
    Version,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let telemetry_config = preflight_telemetry::TelemetryConfig::new("preflight")
        .with_log_level(&cli.log_level);

    let telemetry_config = if cli.json_logs {
        telemetry_config.with_json_logs()
    } else {
        telemetry_config
    };

    preflight_telemetry::init_logging(&telemetry_config);

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_file,
            no_cors,
            strict_persistence,
            ephemeral,
        } => {
            let cfg = config::Config::load();
            let options = commands::ServeOptions {
                host,
                port,
                data_file,
                no_cors,
                strict_persistence,
                ephemeral,
            };
            commands::serve(options, &cfg).await?;
        },

        Commands::Version => {
            commands::version();
        },

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                config::show_config();
            },
            ConfigAction::Init { force } => {
                commands::config_init(force)?;
            },
            ConfigAction::Path => {
                println!("{}", config::Config::config_path().display());
            },
        },
    }

    Ok(())
}
