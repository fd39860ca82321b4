//! Wattcast CLI - Energy billing forecaster
//!
//! Usage:
//!   wattcast serve --port 5000          Start web server
//!   wattcast forecast --file usage.csv  Predict next month's bill
//!   wattcast trend --file usage.csv     Forecast several months ahead
//!   wattcast summary --file usage.csv   Summarize a CSV

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            static_dir,
        } => {
            let port = commands::resolve_port(port, std::env::var("PORT").ok().as_deref())?;
            commands::cmd_serve(&host, port, static_dir.as_deref(), config).await
        }
        Commands::Forecast { file, month, json } => {
            commands::cmd_forecast(&file, month.as_deref(), &config, json)
        }
        Commands::Trend {
            file,
            periods,
            json,
        } => commands::cmd_trend(&file, periods, &config, json),
        Commands::Summary { file, json } => commands::cmd_summary(&file, &config, json),
    }
}
