//! Gridwall server binary.
//!
//! Wires configuration, logging, and the HTTP + `WebSocket` server
//! together and runs until the server stops or `Ctrl-C` is received.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `gridwall-config.yaml` (or `GRIDWALL_CONFIG`),
//!    then apply environment overrides
//! 2. Initialize structured logging (tracing)
//! 3. Build a blank board from the configuration
//! 4. Bind the listener and spawn the server
//! 5. Wait for shutdown

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use gridwall_core::GridwallConfig;
use gridwall_server::{spawn_server, AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "gridwall-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the listener cannot be
/// bound, or the server task fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is not up yet, so the level it names
    //    can seed the filter.
    let config_path = config_path(|key| std::env::var(key).ok());
    let config = GridwallConfig::load(&config_path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("gridwall starting");
    info!(
        path = %config_path.display(),
        grid_size = config.grid.size,
        total_cells = config.total_cells(),
        rate_mode = %config.rate_limit.mode,
        window_seconds = config.rate_limit.window_seconds,
        broadcast_capacity = config.broadcast.capacity,
        "Configuration loaded"
    );

    // 3. Build the board.
    let state = Arc::new(AppState::from_config(&config));

    // 4. Bind and spawn the server.
    let server_config = ServerConfig::from(&config.listen);
    let running = spawn_server(&server_config, state).await?;
    info!(addr = %running.addr, "Gridwall server started");

    // 5. Run until the server stops or we are interrupted.
    tokio::select! {
        joined = running.handle => {
            joined.map_err(|e| EngineError::Server {
                message: format!("{e}"),
            })?;
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Interrupt received, shutting down");
        }
    }

    info!("gridwall shutdown complete");
    Ok(())
}

/// Resolve the configuration file path from `GRIDWALL_CONFIG`.
fn config_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("GRIDWALL_CONFIG")
        .filter(|path| !path.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_defaults_to_working_directory_file() {
        assert_eq!(config_path(|_| None), PathBuf::from("gridwall-config.yaml"));
    }

    #[test]
    fn config_path_honours_env() {
        let path = config_path(|key| {
            (key == "GRIDWALL_CONFIG").then(|| String::from("/etc/gridwall.yaml"))
        });
        assert_eq!(path, PathBuf::from("/etc/gridwall.yaml"));
    }

    #[test]
    fn blank_env_value_falls_back_to_default() {
        assert_eq!(
            config_path(|_| Some(String::from("  "))),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
    }
}
