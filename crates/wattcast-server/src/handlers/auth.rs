//! Login handler

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::json_body;
use crate::{AppError, AppState, LoginCredentials};

/// Login request
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub token: String,
}

/// Compare two secrets in constant time for equal lengths
fn secret_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    provided.len() == expected.len() && bool::from(provided.ct_eq(expected))
}

fn credentials_match(request: &LoginRequest, creds: &LoginCredentials) -> bool {
    // Evaluate both so a wrong username takes as long as a wrong password
    let user_ok = secret_eq(&request.username, &creds.username);
    let pass_ok = secret_eq(&request.password, &creds.password);
    user_ok & pass_ok
}

/// POST /api/login - Check credentials and hand out the session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let request = json_body(body, "message")?;

    match &state.config.login {
        Some(creds) if credentials_match(&request, creds) => {
            info!(user = %request.username, "Login succeeded");
            Ok(Json(LoginResponse {
                ok: true,
                token: creds.token.clone(),
            }))
        }
        _ => {
            warn!(user = %request.username, "Login rejected");
            Err(AppError::rejected("Invalid credentials"))
        }
    }
}
