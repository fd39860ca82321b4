//! Forecast command implementations

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use wattcast_core::{models::round2, upcoming_month_labels, ForecastConfig, Forecaster};

use super::load_snapshot;

pub fn cmd_forecast(
    file: &Path,
    month: Option<&str>,
    config: &ForecastConfig,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(file, config)?;
    let forecast = Forecaster::new(config.clone())
        .next_period(snapshot.model.as_deref(), &snapshot.dataset)
        .context("Prediction failed")?;

    let month = match month {
        Some(m) => m.to_string(),
        None => upcoming_month_labels(Local::now().date_naive(), 1)
            .into_iter()
            .next()
            .unwrap_or_default(),
    };

    if json {
        let output = serde_json::json!({
            "month": month,
            "prediction": round2(forecast.consumption_kwh),
            "predicted_bill": round2(forecast.bill_amount),
            "growth_rate": round2(forecast.growth_rate),
            "accuracy": snapshot.accuracy,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("🔮 Forecast for {}", month);
    println!("   Records:     {}", snapshot.dataset.len());
    println!("   Consumption: {:.2} kWh", forecast.consumption_kwh);
    println!("   Bill:        ₹{:.2}", forecast.bill_amount);
    println!("   Growth:      {:+.2}%", forecast.growth_rate);
    if let Some(model) = snapshot.model.as_deref() {
        println!(
            "   Model:       {} (accuracy {:.2}%)",
            model.regressor(),
            snapshot.accuracy
        );
    }

    Ok(())
}

pub fn cmd_trend(
    file: &Path,
    periods: Option<usize>,
    config: &ForecastConfig,
    json: bool,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(n) = periods {
        config.horizon = n;
    }

    let snapshot = load_snapshot(file, &config)?;
    let trend = Forecaster::new(config)
        .horizon(
            snapshot.model.as_deref(),
            &snapshot.dataset,
            Local::now().date_naive(),
        )
        .context("Trend forecast failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&trend)?);
        return Ok(());
    }

    println!("📈 Trend forecast ({} periods)", trend.len());
    println!();
    println!("{:<16} {:>14} {:>14}", "Month", "kWh", "Bill");
    println!("{}", "-".repeat(46));
    for point in &trend {
        println!(
            "{:<16} {:>14.2} {:>14.2}",
            point.month, point.predicted_consumption, point.predicted_bill
        );
    }

    Ok(())
}
