//! Trend model: consumption and bill regressions over the position index
//!
//! Two targets are fitted independently:
//! - consumption from `[index]`
//! - bill from `[index, consumption]`
//!
//! Models are always fitted on every record. Accuracy is scored separately on
//! a held-out split with models that never saw the test rows.

use ndarray::{array, Array1, Array2};
use tracing::{debug, info};

use crate::config::ForecastConfig;
use crate::error::{Error, Result};
use crate::models::{round2, Dataset};
use crate::regression::{r2_score, train_test_split, FittedModel, Regressor};

/// Fewest records for which a held-out accuracy is computed
pub const MIN_RECORDS_FOR_ACCURACY: usize = 4;

/// Fitted consumption and bill models
#[derive(Debug)]
pub struct TrendModel {
    consumption: Box<dyn FittedModel>,
    bill: Box<dyn FittedModel>,
    regressor: &'static str,
    /// Mean held-out R² of both targets, as a percentage
    accuracy: f64,
}

/// Feature matrices and targets for a subset of rows
///
/// Consumption is regressed on `[index]`, bill on `[index, consumption]`.
struct TrainingSet {
    consumption_x: Array2<f64>,
    consumption_y: Array1<f64>,
    bill_x: Array2<f64>,
    bill_y: Array1<f64>,
}

impl TrainingSet {
    fn from_rows(dataset: &Dataset, rows: &[usize]) -> Self {
        let records = dataset.records();
        let n = rows.len();
        let record = |i: usize| &records[rows[i]];

        Self {
            consumption_x: Array2::from_shape_fn((n, 1), |(i, _)| record(i).index as f64),
            consumption_y: (0..n).map(|i| record(i).consumption_kwh).collect(),
            bill_x: Array2::from_shape_fn((n, 2), |(i, j)| match j {
                0 => record(i).index as f64,
                _ => record(i).consumption_kwh,
            }),
            bill_y: (0..n).map(|i| record(i).bill_amount).collect(),
        }
    }
}

impl TrendModel {
    /// Fit both targets on the full dataset and score held-out accuracy
    pub fn fit(dataset: &Dataset, regressor: &dyn Regressor, config: &ForecastConfig) -> Result<Self> {
        if dataset.is_empty() {
            return Err(Error::NoData);
        }

        let all: Vec<usize> = (0..dataset.len()).collect();
        let full = TrainingSet::from_rows(dataset, &all);
        let consumption = regressor.fit(&full.consumption_x, &full.consumption_y)?;
        let bill = regressor.fit(&full.bill_x, &full.bill_y)?;

        let accuracy = held_out_accuracy(dataset, regressor, config)?;

        info!(
            regressor = regressor.name(),
            records = dataset.len(),
            accuracy,
            "Trend model fitted"
        );

        Ok(Self {
            consumption,
            bill,
            regressor: regressor.name(),
            accuracy,
        })
    }

    /// Predicted consumption at a position index
    pub fn predict_consumption(&self, index: usize) -> f64 {
        self.consumption.predict(array![index as f64].view())
    }

    /// Predicted bill at a position index for a given consumption
    pub fn predict_bill(&self, index: usize, consumption: f64) -> f64 {
        self.bill.predict(array![index as f64, consumption].view())
    }

    pub fn regressor(&self) -> &'static str {
        self.regressor
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }
}

/// Mean of the consumption and bill R² on a held-out split, ×100
///
/// Returns 0 below [`MIN_RECORDS_FOR_ACCURACY`] records.
pub fn held_out_accuracy(
    dataset: &Dataset,
    regressor: &dyn Regressor,
    config: &ForecastConfig,
) -> Result<f64> {
    if dataset.len() < MIN_RECORDS_FOR_ACCURACY {
        debug!(records = dataset.len(), "Too few records to score accuracy");
        return Ok(0.0);
    }

    let (train_rows, test_rows) =
        train_test_split(dataset.len(), config.test_fraction, config.seed);
    let train = TrainingSet::from_rows(dataset, &train_rows);
    let test = TrainingSet::from_rows(dataset, &test_rows);

    let consumption = regressor.fit(&train.consumption_x, &train.consumption_y)?;
    let bill = regressor.fit(&train.bill_x, &train.bill_y)?;

    let consumption_pred: Array1<f64> = test
        .consumption_x
        .rows()
        .into_iter()
        .map(|x| consumption.predict(x))
        .collect();
    let bill_pred: Array1<f64> = test
        .bill_x
        .rows()
        .into_iter()
        .map(|x| bill.predict(x))
        .collect();

    let consumption_r2 = r2_score(&test.consumption_y, &consumption_pred);
    let bill_r2 = r2_score(&test.bill_y, &bill_pred);

    Ok(round2((consumption_r2 + bill_r2) / 2.0 * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::{LinearRegression, RandomForestRegressor};

    fn linear_dataset(n: usize) -> Dataset {
        Dataset::from_rows((0..n).map(|i| {
            (
                format!("M{}", i),
                100.0 + 10.0 * i as f64,
                500.0 + 20.0 * i as f64,
            )
        }))
    }

    #[test]
    fn test_fit_empty_is_no_data() {
        let err = TrendModel::fit(
            &Dataset::default(),
            &LinearRegression::new(),
            &ForecastConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoData));
    }

    #[test]
    fn test_linear_trend_extrapolates() {
        let model = TrendModel::fit(
            &linear_dataset(6),
            &LinearRegression::new(),
            &ForecastConfig::default(),
        )
        .unwrap();
        assert!((model.predict_consumption(6) - 160.0).abs() < 1e-6);
        assert!((model.predict_bill(6, 160.0) - 620.0).abs() < 1e-3);
        assert_eq!(model.regressor(), "linear");
    }

    #[test]
    fn test_accuracy_perfect_line() {
        let model = TrendModel::fit(
            &linear_dataset(10),
            &LinearRegression::new(),
            &ForecastConfig::default(),
        )
        .unwrap();
        assert!((model.accuracy() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_accuracy_zero_below_threshold() {
        for n in 1..MIN_RECORDS_FOR_ACCURACY {
            let model = TrendModel::fit(
                &linear_dataset(n),
                &LinearRegression::new(),
                &ForecastConfig::default(),
            )
            .unwrap();
            assert_eq!(model.accuracy(), 0.0);
        }
    }

    #[test]
    fn test_forest_trend_fits() {
        let model = TrendModel::fit(
            &linear_dataset(8),
            &RandomForestRegressor::new(10),
            &ForecastConfig::default(),
        )
        .unwrap();
        assert_eq!(model.regressor(), "random_forest");
        let c = model.predict_consumption(8);
        assert!((100.0..=170.0).contains(&c));
    }
}
