//! Conversation save handler

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::json_body;
use crate::AppError;

fn default_user() -> String {
    "Anonymous".to_string()
}

/// Save request; the conversation is logged, not stored
#[derive(Debug, Deserialize)]
pub struct SaveChatRequest {
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub conversation: Vec<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SaveChatResponse {
    pub ok: bool,
    pub message: String,
}

/// POST /api/save_chat - Acknowledge a conversation
pub async fn save_chat(
    body: Result<Json<SaveChatRequest>, JsonRejection>,
) -> Result<Json<SaveChatResponse>, AppError> {
    let request = json_body(body, "message")?;
    info!(
        user = %request.user,
        messages = request.conversation.len(),
        "Chat saved"
    );
    Ok(Json(SaveChatResponse {
        ok: true,
        message: "Chat saved successfully!".to_string(),
    }))
}
