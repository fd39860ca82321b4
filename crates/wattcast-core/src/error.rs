//! Error types for Wattcast

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required columns! Found: {}", found.join(", "))]
    MissingColumns { found: Vec<String> },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("No data available")]
    NoData,

    #[error("Model has not been trained")]
    ModelNotTrained,

    #[error("Model error: {0}")]
    Model(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
