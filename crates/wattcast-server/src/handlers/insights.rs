//! Insight summary and chat handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::json_body;
use crate::{AppError, AppState};
use wattcast_core::{canned_reply, ChatTurn, Summary};

/// Summary response
#[derive(Serialize)]
pub struct SummaryResponse {
    pub ok: bool,
    pub summary: String,
}

/// POST /api/insights_summary - Text report over the active dataset
pub async fn insights_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SummaryResponse>, AppError> {
    let snapshot = state.store.current()?;
    let summary = Summary::from_dataset(&snapshot.dataset).ok_or_else(|| {
        AppError::rejected("No data available. Please upload a CSV first.").in_field("summary")
    })?;

    Ok(Json(SummaryResponse {
        ok: true,
        summary: summary.render(),
    }))
}

/// Chat request
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: String,
    /// Free-form client context; accepted but not interpreted
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

/// Chat response
#[derive(Serialize)]
pub struct ChatResponse {
    pub ok: bool,
    pub reply: String,
    pub memory: Vec<ChatTurn>,
}

/// POST /api/insights_chat - Canned reply for a question about the data
pub async fn insights_chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let request = json_body(body, "reply")?;
    let query = request.query.trim().to_lowercase();

    let snapshot = state.store.current()?;
    let summary = Summary::from_dataset(&snapshot.dataset).ok_or_else(|| {
        AppError::rejected("No data available. Please upload a CSV first.").in_field("reply")
    })?;

    if request.context.is_some() {
        debug!("Chat context supplied; ignoring");
    }

    let reply = canned_reply(&query, &summary);
    let memory = state.chat.record(&query, &reply)?;

    Ok(Json(ChatResponse {
        ok: true,
        reply,
        memory,
    }))
}
