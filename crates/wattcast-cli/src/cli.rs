//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Wattcast - Forecast your next electricity bill
#[derive(Parser)]
#[command(name = "wattcast")]
#[command(about = "Energy consumption and billing forecaster", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Forecast configuration file (TOML)
    ///
    /// Defaults to ~/.local/share/wattcast/config/forecast.toml when present,
    /// otherwise the built-in settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on (falls back to $PORT, then 5000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing the dashboard build to serve (e.g., energy-frontend/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Predict the period after the last row of a CSV
    Forecast {
        /// CSV file with month, consumption and bill columns
        #[arg(short, long)]
        file: PathBuf,

        /// Label for the predicted period (defaults to next calendar month)
        #[arg(short, long)]
        month: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Forecast several periods ahead
    Trend {
        /// CSV file with month, consumption and bill columns
        #[arg(short, long)]
        file: PathBuf,

        /// Number of periods (defaults to the configured horizon)
        #[arg(short, long)]
        periods: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Summarize consumption and billing in a CSV
    Summary {
        /// CSV file with month, consumption and bill columns
        #[arg(short, long)]
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}
