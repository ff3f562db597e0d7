//! MATCHDAY: football match prediction and betting value analysis
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the prediction engine and serves the HTTP API until Ctrl+C.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use matchday::api::{self, routes::ApiState};
use matchday::config::AppConfig;
use matchday::engine::PredictionEngine;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    // A missing file runs on defaults; a broken one is fatal.
    let cfg = if Path::new(CONFIG_PATH).exists() {
        AppConfig::load(CONFIG_PATH)?
    } else {
        warn!(path = CONFIG_PATH, "Config file not found, using defaults");
        AppConfig::default()
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %cfg.server.bind_addr(),
        ml_enabled = cfg.ml_service.enabled,
        ml_url = %cfg.ml_service.base_url,
        leagues = cfg.leagues.len(),
        "MATCHDAY starting up"
    );

    let engine = PredictionEngine::from_config(&cfg)?;
    if engine.has_external() {
        let status = engine.ml_status().await;
        if status.reachable {
            info!("ML service reachable");
        } else {
            warn!(
                error = status.error.as_deref().unwrap_or("unhealthy"),
                "ML service not reachable, predictions will fall back to heuristics"
            );
        }
    }

    api::serve(Arc::new(ApiState::new(engine)), &cfg.server).await?;

    info!("MATCHDAY shut down cleanly");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("matchday=info"));

    let json_logging = std::env::var("MATCHDAY_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
