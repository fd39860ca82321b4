//! Wattcast Web Server
//!
//! Axum-based REST API for the Wattcast energy billing forecaster.
//!
//! Security features:
//! - CORS policy built from configured origins
//! - Upload size limits (body limit plus a running check on the file field)
//! - Constant-time credential comparison on login
//! - Sanitized error responses in the dashboard's `{ ok, message }` envelope

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use wattcast_core::{ChatMemory, ForecastConfig, Forecaster, SnapshotStore};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Slack above [`MAX_UPLOAD_SIZE`] for multipart boundaries and part headers
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Credentials accepted by `/api/login` and the token it hands out
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
    pub token: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl LoginCredentials {
    /// Read `WATTCAST_ADMIN_USER`, `WATTCAST_ADMIN_PASSWORD` and
    /// `WATTCAST_LOGIN_TOKEN`; None unless user and password are both set
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("WATTCAST_ADMIN_USER").ok().filter(|s| !s.is_empty())?;
        let password = std::env::var("WATTCAST_ADMIN_PASSWORD")
            .ok()
            .filter(|s| !s.is_empty())?;
        let token = std::env::var("WATTCAST_LOGIN_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "wattcast_session".to_string());
        Some(Self {
            username,
            password,
            token,
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = any origin, for local dashboards)
    pub allowed_origins: Vec<String>,
    /// Login credentials; when None every login attempt is rejected
    pub login: Option<LoginCredentials>,
    /// Model and forecasting settings
    pub forecast: ForecastConfig,
}

/// Shared application state
pub struct AppState {
    pub store: SnapshotStore,
    pub chat: ChatMemory,
    pub forecaster: Forecaster,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            store: SnapshotStore::new(),
            chat: ChatMemory::new(),
            forecaster: Forecaster::new(config.forecast.clone()),
            config,
        }
    }
}

/// GET / - Liveness message
async fn home() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Wattcast energy forecasting backend running"
    }))
}

/// Create the application router
pub fn create_router(config: ServerConfig, static_dir: Option<&str>) -> Router {
    let state = Arc::new(AppState::new(config.clone()));

    let api_routes = Router::new()
        // Dataset
        .route("/upload", post(handlers::upload))
        .route("/data", get(handlers::get_data))
        .route("/search", get(handlers::search_months))
        // Forecasting
        .route("/predict", post(handlers::predict))
        .route("/retrain", post(handlers::retrain))
        .route("/trend", get(handlers::trend))
        // Insights
        .route("/insights_summary", post(handlers::insights_summary))
        .route("/insights_chat", post(handlers::insights_chat))
        // Session
        .route("/login", post(handlers::login))
        .route("/save_chat", post(handlers::save_chat));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    // Security headers
    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    let mut app = Router::new()
        .route("/", get(home))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + MULTIPART_OVERHEAD))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(security_headers);

    // Serve the dashboard build if a directory is provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.login.is_none() {
        warn!("Login credentials not configured; /api/login will reject every attempt");
    }
    info!(
        regressor = %config.forecast.regressor,
        horizon = config.forecast.horizon,
        "Forecast settings loaded"
    );

    let app = create_router(config, static_dir);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error rendered as `{ "ok": false, <field>: <message> }`
///
/// Most endpoints report failures with HTTP 200 and let the envelope carry
/// the outcome; only upload and malformed requests use error statuses.
pub struct AppError {
    status: StatusCode,
    field: &'static str,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            field: "message",
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            field: "message",
            message: msg.to_string(),
            internal: None,
        }
    }

    /// A request the server understood but declined, reported with 200
    pub fn rejected(msg: &str) -> Self {
        Self {
            status: StatusCode::OK,
            field: "message",
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Report the message under a different envelope key
    pub fn in_field(mut self, field: &'static str) -> Self {
        self.field = field;
        self
    }

    /// Attach an underlying error to be logged when the response is built
    pub fn caused_by(mut self, err: impl Into<anyhow::Error>) -> Self {
        self.internal = Some(err.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, status = %self.status, "Request failed");
        }

        let mut body = serde_json::Map::new();
        body.insert("ok".to_string(), serde_json::Value::Bool(false));
        body.insert(
            self.field.to_string(),
            serde_json::Value::String(self.message),
        );

        (self.status, Json(serde_json::Value::Object(body))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            field: "message",
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
