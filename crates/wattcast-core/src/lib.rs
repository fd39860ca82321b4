//! Wattcast Core Library
//!
//! Shared functionality for the Wattcast energy billing forecaster:
//! - CSV ingest with heuristic column detection
//! - Pluggable regression models (linear, random forest)
//! - Trend model fitting with held-out accuracy
//! - Smoothed next-period and multi-period forecasts
//! - Summary reports and canned insight replies
//! - Snapshot store for the active dataset/model pair

pub mod chat;
pub mod config;
pub mod error;
pub mod forecast;
pub mod ingest;
pub mod models;
pub mod regression;
pub mod report;
pub mod store;
pub mod trend;

pub use chat::{canned_reply, ChatMemory, CHAT_MEMORY_LIMIT};
pub use config::{BillStrategy, ConsumptionStrategy, ForecastConfig};
pub use error::{Error, Result};
pub use forecast::{upcoming_month_labels, Forecaster};
pub use ingest::{detect_columns, parse_csv, ParsedUpload};
pub use models::{ChatTurn, ColumnRoles, Dataset, Forecast, Metrics, Record, TrendPoint};
pub use regression::{FittedModel, LinearRegression, RandomForestRegressor, Regressor, RegressorKind};
pub use report::Summary;
pub use store::{Snapshot, SnapshotStore};
pub use trend::TrendModel;
