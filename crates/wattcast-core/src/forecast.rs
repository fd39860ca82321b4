//! Next-period and multi-period forecasting
//!
//! Raw bill estimates are blended with the trailing mean of recent bills to
//! dampen swings between periods.

use chrono::{Datelike, NaiveDate};

use crate::config::{BillStrategy, ConsumptionStrategy, ForecastConfig};
use crate::error::{Error, Result};
use crate::models::{round2, Dataset, Forecast, TrendPoint};
use crate::trend::TrendModel;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Produces forecasts from a dataset and its trend model
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    fn needs_model(&self) -> bool {
        self.config.consumption_strategy == ConsumptionStrategy::Regression
            || self.config.bill_strategy == BillStrategy::Regression
    }

    /// Estimate the period following the last record
    ///
    /// Values are unrounded; callers round for display.
    pub fn next_period(&self, model: Option<&TrendModel>, dataset: &Dataset) -> Result<Forecast> {
        let last = dataset.last().ok_or(Error::NoData)?;
        let model = match model {
            Some(m) => Some(m),
            None if self.needs_model() => return Err(Error::ModelNotTrained),
            None => None,
        };

        // 0-based indices: the next period sits one past the last record
        let next_index = dataset.len();

        let consumption = match (self.config.consumption_strategy, model) {
            (ConsumptionStrategy::Regression, Some(m)) => m.predict_consumption(next_index),
            _ => {
                last.consumption_kwh
                    * (1.0 + mean_change(&dataset.consumption()).unwrap_or(self.config.fallback_growth))
            }
        };

        let raw_bill = match (self.config.bill_strategy, model) {
            (BillStrategy::Regression, Some(m)) => m.predict_bill(next_index, consumption),
            _ => consumption * rate_per_unit(dataset).unwrap_or(self.config.default_rate),
        };

        let bill = self.smooth(raw_bill, &dataset.bills());
        let growth_rate = growth_rate(bill, last.bill_amount);

        Ok(Forecast {
            consumption_kwh: consumption,
            bill_amount: bill,
            growth_rate,
        })
    }

    /// Blend a raw estimate with the trailing mean of recent bills
    ///
    /// Applies only once `smoothing_window` bills exist.
    pub fn smooth(&self, raw: f64, bills: &[f64]) -> f64 {
        let window = self.config.smoothing_window.max(1);
        if bills.len() < window {
            return raw;
        }
        let trailing = bills[bills.len() - window..].iter().sum::<f64>() / window as f64;
        let w = self.config.smoothing_weight;
        w * raw + (1.0 - w) * trailing
    }

    /// Roll the single-step forecast forward over the configured horizon
    ///
    /// Each step sees the previous steps' forecasts as history. Labels are
    /// the calendar months after `start`.
    pub fn horizon(
        &self,
        model: Option<&TrendModel>,
        dataset: &Dataset,
        start: NaiveDate,
    ) -> Result<Vec<TrendPoint>> {
        if dataset.is_empty() {
            return Err(Error::NoData);
        }

        let labels = upcoming_month_labels(start, self.config.horizon);
        let mut history = dataset.clone();
        let mut points = Vec::with_capacity(labels.len());

        for label in labels {
            let step = self.next_period(model, &history)?;
            history.push(label.clone(), step.consumption_kwh, step.bill_amount);
            points.push(TrendPoint {
                month: label,
                predicted_consumption: round2(step.consumption_kwh),
                predicted_bill: round2(step.bill_amount),
            });
        }

        Ok(points)
    }
}

/// Percent change from `last` to `predicted`, 0 when `last` is 0
pub fn growth_rate(predicted: f64, last: f64) -> f64 {
    if last == 0.0 {
        0.0
    } else {
        (predicted - last) / last * 100.0
    }
}

/// Mean fractional period-over-period change
///
/// Steps from a zero value are skipped. None when no step is usable.
pub fn mean_change(values: &[f64]) -> Option<f64> {
    let changes: Vec<f64> = values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if changes.is_empty() {
        None
    } else {
        Some(changes.iter().sum::<f64>() / changes.len() as f64)
    }
}

/// Mean bill per unit over rows with both consumption and bill non-zero
pub fn rate_per_unit(dataset: &Dataset) -> Option<f64> {
    let rates: Vec<f64> = dataset
        .records()
        .iter()
        .filter(|r| r.consumption_kwh != 0.0 && r.bill_amount != 0.0)
        .map(|r| r.bill_amount / r.consumption_kwh)
        .collect();
    if rates.is_empty() {
        None
    } else {
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    }
}

/// `"<Month> <Year>"` labels for the `n` months after `start`'s month
pub fn upcoming_month_labels(start: NaiveDate, n: usize) -> Vec<String> {
    let mut month0 = start.month0() as usize;
    let mut year = start.year();
    (0..n)
        .map(|_| {
            month0 += 1;
            if month0 == 12 {
                month0 = 0;
                year += 1;
            }
            format!("{} {}", MONTH_NAMES[month0], year)
        })
        .collect()
}
