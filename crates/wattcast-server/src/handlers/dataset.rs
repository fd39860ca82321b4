//! Dataset upload and query handlers

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    Json,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use wattcast_core::{upcoming_month_labels, ColumnRoles, Dataset, Error, Metrics};

/// Number of candidate forecast periods offered after an upload
const AVAILABLE_MONTHS: usize = 4;

/// Upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub message: String,
    pub metrics: Metrics,
    pub data: Dataset,
    pub columns: Option<ColumnRoles>,
    /// SHA-256 of the uploaded file
    pub fingerprint: String,
    pub loaded_at: Option<DateTime<Utc>>,
    pub available_months: Vec<String>,
}

/// POST /api/upload - Replace the active dataset from a CSV
///
/// Expects multipart form with:
/// - file: CSV file (required, max 10MB)
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| {
        warn!(error = %e, "Upload without multipart body");
        AppError::bad_request("No file uploaded!")
    })?;

    let mut file_data: Option<Vec<u8>> = None;
    let mut total_size: usize = 0;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mut buf = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?
        {
            total_size += chunk.len();

            // Check file size limit
            if total_size > MAX_UPLOAD_SIZE {
                return Err(AppError::bad_request(&format!(
                    "File too large. Maximum size is {} MB",
                    MAX_UPLOAD_SIZE / 1024 / 1024
                )));
            }
            buf.extend_from_slice(&chunk);
        }
        file_data = Some(buf);
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("No file uploaded!"))?;
    let size = file_data.len();

    // Parsing and fitting are CPU-bound
    let worker = Arc::clone(&state);
    let snapshot = tokio::task::spawn_blocking(move || {
        worker.store.ingest(&file_data, &worker.config.forecast)
    })
    .await?
    .map_err(|e| match e {
        Error::MissingColumns { .. } | Error::InvalidData(_) | Error::Csv(_) => {
            warn!(error = %e, "Rejected upload");
            AppError::bad_request(&e.to_string())
        }
        other => AppError::internal(&format!("Upload failed: {}", other)).caused_by(other),
    })?;

    info!(
        bytes = size,
        records = snapshot.dataset.len(),
        trained = snapshot.model.is_some(),
        "CSV uploaded"
    );

    let message = if snapshot.model.is_some() {
        "CSV uploaded successfully and models trained!"
    } else {
        "CSV uploaded successfully! Add at least 4 rows or retrain to enable predictions."
    };

    Ok(Json(UploadResponse {
        ok: true,
        message: message.to_string(),
        metrics: snapshot.metrics(),
        data: snapshot.dataset.as_ref().clone(),
        columns: snapshot.columns.clone(),
        fingerprint: snapshot.fingerprint.clone().unwrap_or_default(),
        loaded_at: snapshot.loaded_at,
        available_months: upcoming_month_labels(Local::now().date_naive(), AVAILABLE_MONTHS),
    }))
}

/// Current dataset response
#[derive(Serialize)]
pub struct DataResponse {
    pub ok: bool,
    pub data: Dataset,
    pub metrics: Metrics,
    pub fingerprint: Option<String>,
    /// When the active dataset was uploaded
    pub loaded_at: Option<DateTime<Utc>>,
}

/// GET /api/data - The active dataset and its metrics
pub async fn get_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse>, AppError> {
    let snapshot = state.store.current()?;
    Ok(Json(DataResponse {
        ok: true,
        data: snapshot.dataset.as_ref().clone(),
        metrics: snapshot.metrics(),
        fingerprint: snapshot.fingerprint.clone(),
        loaded_at: snapshot.loaded_at,
    }))
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search response
#[derive(Serialize)]
pub struct SearchResponse {
    pub ok: bool,
    pub query: String,
    pub months: Vec<String>,
}

/// GET /api/search?q= - Period labels containing `q`, in dataset order
pub async fn search_months(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let snapshot = state.store.current()?;
    let months = snapshot.dataset.search_months(&params.q);
    Ok(Json(SearchResponse {
        ok: true,
        query: params.q,
        months,
    }))
}
