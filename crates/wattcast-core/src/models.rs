//! Domain models for Wattcast

use serde::{Deserialize, Serialize};

/// Placeholder label for rows with a blank period column
pub const UNKNOWN_PERIOD: &str = "Unknown";

/// One period (row) of an uploaded dataset
///
/// Field names on the wire match the column names the dashboard charts use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 0-based position in the upload, used as the time-trend feature
    pub index: usize,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Consumption_kWh")]
    pub consumption_kwh: f64,
    #[serde(rename = "Bill_Amount")]
    pub bill_amount: f64,
}

/// An ordered sequence of monthly records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from `(month, consumption, bill)` rows, assigning indices in order
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<String>,
    {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, (month, consumption_kwh, bill_amount))| Record {
                index,
                month: month.into(),
                consumption_kwh,
                bill_amount,
            })
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    pub fn consumption(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.consumption_kwh).collect()
    }

    pub fn bills(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.bill_amount).collect()
    }

    /// Append a record at the next position index
    pub fn push(&mut self, month: impl Into<String>, consumption_kwh: f64, bill_amount: f64) {
        let index = self.records.len();
        self.records.push(Record {
            index,
            month: month.into(),
            consumption_kwh,
            bill_amount,
        });
    }

    /// Period labels containing `query`, case-insensitive, in dataset order
    pub fn search_months(&self, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.month.to_lowercase().contains(&needle))
            .map(|r| r.month.clone())
            .collect()
    }
}

/// Which CSV column plays which role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// Normalized header of the period label column
    pub period: String,
    /// Normalized header of the consumption column
    pub quantity: String,
    /// Normalized header of the billed amount column
    pub amount: String,
}

/// Headline numbers shown on the dashboard cards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_energy: f64,
    pub avg_bill: f64,
    pub accuracy: f64,
}

impl Metrics {
    pub fn new(dataset: &Dataset, accuracy: f64) -> Self {
        let total: f64 = dataset.records().iter().map(|r| r.consumption_kwh).sum();
        let avg_bill = if dataset.is_empty() {
            0.0
        } else {
            dataset.records().iter().map(|r| r.bill_amount).sum::<f64>() / dataset.len() as f64
        };
        Self {
            total_energy: round2(total),
            avg_bill: round2(avg_bill),
            accuracy: round2(accuracy),
        }
    }
}

/// A single next-period estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub consumption_kwh: f64,
    pub bill_amount: f64,
    /// Percent change of the predicted bill against the last actual bill
    pub growth_rate: f64,
}

/// One step of a multi-period forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: String,
    pub predicted_consumption: f64,
    pub predicted_bill: f64,
}

/// One exchange kept in chat memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user: String,
    pub assistant: String,
}

/// Round to two decimal places for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_rows([
            ("January 2025", 100.0, 500.0),
            ("February 2025", 110.0, 520.0),
            ("March 2025", 0.0, 0.0),
        ])
    }

    #[test]
    fn test_from_rows_assigns_indices() {
        let ds = sample();
        let indices: Vec<usize> = ds.records().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_push_continues_indices() {
        let mut ds = sample();
        ds.push("April 2025", 120.0, 540.0);
        assert_eq!(ds.last().unwrap().index, 3);
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn test_search_months_case_insensitive_in_order() {
        let ds = sample();
        assert_eq!(
            ds.search_months("UARY"),
            vec!["January 2025".to_string(), "February 2025".to_string()]
        );
        assert!(ds.search_months("december").is_empty());
        assert_eq!(ds.search_months("").len(), 3);
    }

    #[test]
    fn test_metrics() {
        let m = Metrics::new(&sample(), 87.456);
        assert_eq!(m.total_energy, 210.0);
        assert_eq!(m.avg_bill, 340.0);
        assert_eq!(m.accuracy, 87.46);
    }

    #[test]
    fn test_metrics_empty() {
        let m = Metrics::new(&Dataset::default(), 0.0);
        assert_eq!(m.total_energy, 0.0);
        assert_eq!(m.avg_bill, 0.0);
    }

    #[test]
    fn test_record_wire_names() {
        let json = serde_json::to_value(&sample().records()[0]).unwrap();
        assert_eq!(json["Month"], "January 2025");
        assert_eq!(json["Consumption_kWh"], 100.0);
        assert_eq!(json["Bill_Amount"], 500.0);
        assert_eq!(json["index"], 0);
    }
}
