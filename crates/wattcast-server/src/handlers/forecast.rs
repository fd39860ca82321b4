//! Prediction, retraining and trend handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::json_body;
use crate::{AppError, AppState};
use wattcast_core::{models::round2, Error, Metrics, TrendPoint};

/// Advice returned with every prediction
const PRECAUTIONS: [&str; 3] = [
    "Optimize high-load hours to reduce peaks.",
    "Perform equipment maintenance to sustain efficiency.",
    "Analyze the last 3 months for usage optimization.",
];

/// Prediction request
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub month: Option<String>,
}

/// Prediction response
#[derive(Serialize)]
pub struct PredictResponse {
    pub ok: bool,
    pub month: String,
    /// Predicted consumption in kWh
    pub prediction: f64,
    pub predicted_bill: f64,
    pub growth_rate: f64,
    pub precautions: Vec<&'static str>,
}

/// POST /api/predict - Forecast the period after the last record
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let snapshot = state.store.current()?;
    if snapshot.is_empty() {
        return Err(AppError::rejected("Upload a CSV before predicting!"));
    }

    let request = json_body(body, "message")?;
    let month = request
        .month
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::rejected("Please provide a month name!"))?;

    let forecast = state
        .forecaster
        .next_period(snapshot.model.as_deref(), &snapshot.dataset)
        .map_err(|e| match e {
            Error::ModelNotTrained => AppError::rejected(
                "Model not trained yet! Upload at least 4 rows or retrain first.",
            ),
            Error::NoData => AppError::rejected("Upload a CSV before predicting!"),
            other => {
                AppError::rejected(&format!("Prediction failed: {}", other)).caused_by(other)
            }
        })?;

    debug!(
        month = %month,
        consumption = forecast.consumption_kwh,
        bill = forecast.bill_amount,
        "Prediction served"
    );

    Ok(Json(PredictResponse {
        ok: true,
        month,
        prediction: round2(forecast.consumption_kwh),
        predicted_bill: round2(forecast.bill_amount),
        growth_rate: round2(forecast.growth_rate),
        precautions: PRECAUTIONS.to_vec(),
    }))
}

/// Retrain response
#[derive(Serialize)]
pub struct RetrainResponse {
    pub ok: bool,
    pub message: String,
    pub regressor: &'static str,
    pub accuracy: f64,
    pub metrics: Metrics,
}

/// POST /api/retrain - Refit the models against the active dataset
pub async fn retrain(State(state): State<Arc<AppState>>) -> Result<Json<RetrainResponse>, AppError> {
    let worker = Arc::clone(&state);
    let snapshot = tokio::task::spawn_blocking(move || worker.store.retrain(&worker.config.forecast))
        .await?
        .map_err(|e| match e {
            Error::NoData => AppError::rejected("Upload data before retraining!"),
            Error::State(_) => {
                warn!(error = %e, "Retrain lost a race with an upload");
                AppError::rejected(&format!("Retraining failed: {}", e))
            }
            other => AppError::rejected(&format!("Retraining failed: {}", other)).caused_by(other),
        })?;

    let Some(model) = snapshot.model.as_deref() else {
        return Err(AppError::internal("Retraining produced no model"));
    };

    info!(
        generation = snapshot.generation,
        regressor = model.regressor(),
        accuracy = snapshot.accuracy,
        "Retrain complete"
    );

    Ok(Json(RetrainResponse {
        ok: true,
        message: "Models retrained successfully!".to_string(),
        regressor: model.regressor(),
        accuracy: snapshot.accuracy,
        metrics: snapshot.metrics(),
    }))
}

/// Trend response
#[derive(Serialize)]
pub struct TrendResponse {
    pub ok: bool,
    pub trend: Vec<TrendPoint>,
}

/// GET /api/trend - Multi-period forecast over the configured horizon
pub async fn trend(State(state): State<Arc<AppState>>) -> Result<Json<TrendResponse>, AppError> {
    let snapshot = state.store.current()?;
    if snapshot.is_empty() {
        return Err(AppError::rejected("Upload a CSV before forecasting!"));
    }

    let trend = state
        .forecaster
        .horizon(
            snapshot.model.as_deref(),
            &snapshot.dataset,
            Local::now().date_naive(),
        )
        .map_err(|e| match e {
            Error::ModelNotTrained => AppError::rejected(
                "Model not trained yet! Upload at least 4 rows or retrain first.",
            ),
            other => AppError::rejected(&format!("Trend forecast failed: {}", other)).caused_by(other),
        })?;

    Ok(Json(TrendResponse { ok: true, trend }))
}
