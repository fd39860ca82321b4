//! Shared utilities for commands
//!
//! This module contains:
//! - `load_config` - Resolve and parse the forecast configuration
//! - `load_snapshot` - Read a CSV from disk and fit models on it
//! - `resolve_port` - Pick the server port from flag or environment

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use wattcast_core::{ForecastConfig, Snapshot, SnapshotStore};

/// Default server port, matching the dashboard's expected backend address
pub const DEFAULT_PORT: u16 = 5000;

/// Load forecast settings from `--config`, the user override, or built-ins
pub fn load_config(path: Option<&Path>) -> Result<ForecastConfig> {
    let config = ForecastConfig::load(path).context("Failed to load forecast configuration")?;
    debug!(?config, "Forecast configuration resolved");
    Ok(config)
}

/// Read a CSV and fit models on it
///
/// Unlike uploads to the server, small files are always fitted so offline
/// commands work on any non-empty dataset.
pub fn load_snapshot(file: &Path, config: &ForecastConfig) -> Result<Arc<Snapshot>> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let store = SnapshotStore::new();
    let snapshot = store
        .ingest(&bytes, config)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    if snapshot.model.is_some() {
        return Ok(snapshot);
    }
    store.retrain(config).context("Failed to fit models")
}

/// `--port` if given, else `$PORT`, else [`DEFAULT_PORT`]
pub fn resolve_port(flag: Option<u16>, env: Option<&str>) -> Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid PORT value: {}", value)),
        None => Ok(DEFAULT_PORT),
    }
}
