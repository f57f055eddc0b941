use branch_hook::AppState;
use branch_hook::config::ListenerConfig;
use branch_hook::logging::setup_logging;
use branch_hook::server;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "webhook_config.toml";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config_path =
        std::env::var("WEBHOOK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let port_override = std::env::var("WEBHOOK_PORT").ok();

    let config = match ListenerConfig::load(Path::new(&config_path)) {
        Ok(cfg) => cfg.with_port_override(port_override.as_deref()),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let _log_guard = match setup_logging(config.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {}", e);
            std::process::exit(1);
        }
    };

    if Path::new(&config_path).exists() {
        info!("Using config at {:?}", config_path);
    } else {
        info!("No config file at {:?}, using defaults", config_path);
    }

    let state = Arc::new(AppState::new(config));
    if let Err(e) = server::serve(state).await {
        error!("Webhook listener stopped: {}", e);
        std::process::exit(1);
    }
}
