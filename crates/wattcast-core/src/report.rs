//! Descriptive summaries of the active dataset

use serde::Serialize;

use crate::models::Dataset;

/// A period and its consumption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodUsage {
    pub month: String,
    pub consumption_kwh: f64,
}

/// Aggregate statistics over a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_consumption: f64,
    pub average_bill: f64,
    pub peak: PeriodUsage,
    pub lowest: PeriodUsage,
    /// Mean of bill / consumption, zero consumption counted as 1
    pub cost_per_unit: f64,
}

impl Summary {
    /// None for an empty dataset
    pub fn from_dataset(dataset: &Dataset) -> Option<Self> {
        let records = dataset.records();
        let first = records.first()?;
        let n = records.len() as f64;

        let mut peak = first;
        let mut lowest = first;
        for r in &records[1..] {
            // Strict comparisons keep the first occurrence on ties
            if r.consumption_kwh > peak.consumption_kwh {
                peak = r;
            }
            if r.consumption_kwh < lowest.consumption_kwh {
                lowest = r;
            }
        }

        let cost_per_unit = records
            .iter()
            .map(|r| {
                let units = if r.consumption_kwh == 0.0 {
                    1.0
                } else {
                    r.consumption_kwh
                };
                r.bill_amount / units
            })
            .sum::<f64>()
            / n;

        Some(Self {
            total_consumption: records.iter().map(|r| r.consumption_kwh).sum(),
            average_bill: records.iter().map(|r| r.bill_amount).sum::<f64>() / n,
            peak: PeriodUsage {
                month: peak.month.clone(),
                consumption_kwh: peak.consumption_kwh,
            },
            lowest: PeriodUsage {
                month: lowest.month.clone(),
                consumption_kwh: lowest.consumption_kwh,
            },
            cost_per_unit,
        })
    }

    /// Fixed text report
    pub fn render(&self) -> String {
        format!(
            "AI Energy Insights Summary\n\n\
             - Total consumption: **{:.2} kWh**\n\
             - Average monthly bill: **₹{}**\n\
             - Peak consumption in **{}** ({:.0} kWh)\n\
             - Lowest in **{}** ({:.0} kWh)\n\
             - Avg cost efficiency: **₹{:.2}/kWh**\n",
            self.total_consumption,
            group_thousands(self.average_bill),
            self.peak.month,
            self.peak.consumption_kwh,
            self.lowest.month,
            self.lowest.consumption_kwh,
            self.cost_per_unit,
        )
    }
}

/// Round to a whole number and insert `,` every three digits
pub fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}
