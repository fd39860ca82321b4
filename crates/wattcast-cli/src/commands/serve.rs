//! Server command implementation

use std::path::Path;

use anyhow::Result;
use wattcast_core::ForecastConfig;
use wattcast_server::{LoginCredentials, ServerConfig};

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub async fn cmd_serve(
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
    forecast: ForecastConfig,
) -> Result<()> {
    println!("🚀 Starting Wattcast web server...");
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    println!(
        "   Model: {} (horizon {} months)",
        forecast.regressor, forecast.horizon
    );

    let allowed_origins =
        parse_origins(&std::env::var("WATTCAST_ALLOWED_ORIGINS").unwrap_or_default());
    if allowed_origins.is_empty() {
        println!("   🌐 CORS: any origin (set WATTCAST_ALLOWED_ORIGINS to restrict)");
    } else {
        println!("   🌐 CORS: {}", allowed_origins.join(", "));
    }

    let login = LoginCredentials::from_env();
    match &login {
        Some(creds) => println!("   🔑 Login: enabled for '{}'", creds.username),
        None => {
            println!("   ⚠️  Login disabled (set WATTCAST_ADMIN_USER and WATTCAST_ADMIN_PASSWORD)")
        }
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let config = ServerConfig {
        allowed_origins,
        login,
        forecast,
    };

    let static_dir = static_dir.map(|p| p.to_string_lossy().into_owned());
    wattcast_server::serve_with_config(host, port, static_dir.as_deref(), config).await
}
