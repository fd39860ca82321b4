//! Report command implementations

use std::path::Path;

use anyhow::{Context, Result};
use wattcast_core::{ForecastConfig, Summary};

use super::load_snapshot;

pub fn cmd_summary(file: &Path, config: &ForecastConfig, json: bool) -> Result<()> {
    let snapshot = load_snapshot(file, config)?;
    let summary = Summary::from_dataset(&snapshot.dataset).context("No data available")?;

    if json {
        let output = serde_json::json!({
            "summary": summary,
            "metrics": snapshot.metrics(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", summary.render());
    Ok(())
}
