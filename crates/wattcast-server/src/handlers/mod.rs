//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod auth;
pub mod chat;
pub mod dataset;
pub mod forecast;
pub mod insights;

// Re-export all handlers for use in router
pub use auth::*;
pub use chat::*;
pub use dataset::*;
pub use forecast::*;
pub use insights::*;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use tracing::warn;

use crate::AppError;

/// Unwrap a JSON body, reporting malformed input as a 400 envelope under `field`
pub(crate) fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    field: &'static str,
) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected malformed JSON body");
            Err(AppError::bad_request(&format!("Invalid request body: {}", rejection.body_text()))
                .in_field(field))
        }
    }
}
