//! Forecast configuration
//!
//! ## Configuration Resolution
//!
//! 1. An explicit path (`--config`), if given and present
//! 2. Override in data dir (~/.local/share/wattcast/config/forecast.toml)
//! 3. Embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::regression::RegressorKind;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/forecast.toml");

/// How the next period's consumption is estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionStrategy {
    /// Consumption model evaluated at the next position index
    #[default]
    Regression,
    /// Last value scaled by the mean period-over-period change
    MeanChange,
}

impl FromStr for ConsumptionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regression" => Ok(Self::Regression),
            "mean_change" => Ok(Self::MeanChange),
            _ => Err(format!("Unknown consumption strategy: {}", s)),
        }
    }
}

/// How the next period's bill is estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStrategy {
    /// Bill model evaluated at (next index, estimated consumption)
    #[default]
    Regression,
    /// Estimated consumption times the historical rate per unit
    RatePerUnit,
}

impl FromStr for BillStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regression" => Ok(Self::Regression),
            "rate_per_unit" => Ok(Self::RatePerUnit),
            _ => Err(format!("Unknown bill strategy: {}", s)),
        }
    }
}

/// Settings for model fitting and forecasting
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub regressor: RegressorKind,
    pub forest_trees: usize,
    pub seed: u64,
    pub test_fraction: f64,
    pub consumption_strategy: ConsumptionStrategy,
    pub bill_strategy: BillStrategy,
    pub fallback_growth: f64,
    pub default_rate: f64,
    pub horizon: usize,
    /// Weight of the raw bill estimate in the smoothing blend
    pub smoothing_weight: f64,
    pub smoothing_window: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            regressor: RegressorKind::Linear,
            forest_trees: 50,
            seed: 42,
            test_fraction: 0.2,
            consumption_strategy: ConsumptionStrategy::Regression,
            bill_strategy: BillStrategy::Regression,
            fallback_growth: 0.01,
            default_rate: 8.0,
            horizon: 6,
            smoothing_weight: 0.7,
            smoothing_window: 3,
        }
    }
}

impl ForecastConfig {
    /// Load with the standard resolution order
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = match override_path {
            Some(path) if path.exists() => read_config(path)?,
            Some(path) => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )))
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => read_config(&path)?,
                None => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }
}

/// Get the default override config path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("wattcast").join("config").join("forecast.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "Loading forecast config");
    Ok(fs::read_to_string(path)?)
}

// Raw TOML structure

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    model: Option<RawModel>,
    forecast: Option<RawForecast>,
    smoothing: Option<RawSmoothing>,
}

#[derive(Debug, Deserialize)]
struct RawModel {
    regressor: Option<String>,
    forest_trees: Option<usize>,
    seed: Option<u64>,
    test_fraction: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    consumption_strategy: Option<String>,
    bill_strategy: Option<String>,
    fallback_growth: Option<f64>,
    default_rate: Option<f64>,
    horizon: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawSmoothing {
    weight: Option<f64>,
    window: Option<usize>,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<ForecastConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = ForecastConfig::default();

    if let Some(model) = raw.model {
        if let Some(name) = model.regressor {
            config.regressor = name.parse().map_err(Error::Config)?;
        }
        if let Some(trees) = model.forest_trees {
            config.forest_trees = trees.max(1);
        }
        if let Some(seed) = model.seed {
            config.seed = seed;
        }
        if let Some(fraction) = model.test_fraction {
            if !(0.0..1.0).contains(&fraction) {
                return Err(Error::Config(format!(
                    "test_fraction must be in [0, 1), got {}",
                    fraction
                )));
            }
            config.test_fraction = fraction;
        }
    }

    if let Some(forecast) = raw.forecast {
        if let Some(name) = forecast.consumption_strategy {
            config.consumption_strategy = name.parse().map_err(Error::Config)?;
        }
        if let Some(name) = forecast.bill_strategy {
            config.bill_strategy = name.parse().map_err(Error::Config)?;
        }
        if let Some(growth) = forecast.fallback_growth {
            config.fallback_growth = growth;
        }
        if let Some(rate) = forecast.default_rate {
            config.default_rate = rate;
        }
        if let Some(horizon) = forecast.horizon {
            config.horizon = horizon;
        }
    }

    if let Some(smoothing) = raw.smoothing {
        if let Some(weight) = smoothing.weight {
            if !(0.0..=1.0).contains(&weight) {
                return Err(Error::Config(format!(
                    "smoothing weight must be in [0, 1], got {}",
                    weight
                )));
            }
            config.smoothing_weight = weight;
        }
        if let Some(window) = smoothing.window {
            config.smoothing_window = window.max(1);
        }
    }

    Ok(config)
}
