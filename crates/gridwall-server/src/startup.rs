//! Background startup helper.
//!
//! [`spawn_server`] binds the listener eagerly, so address and port
//! conflicts surface to the caller, and then serves on a background
//! Tokio task.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gridwall_server::startup::spawn_server;
//! use gridwall_server::{AppState, ServerConfig};
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::default());
//! let handle = spawn_server(&ServerConfig::default(), state).await?;
//! handle.await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::server::{serve_on, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A server running on a background task.
#[derive(Debug)]
pub struct RunningServer {
    /// The address actually bound (resolves port `0`).
    pub addr: SocketAddr,
    /// Handle to the serving task.
    pub handle: JoinHandle<()>,
}

/// Bind and spawn the HTTP + `WebSocket` server on a background task.
///
/// The server runs until the Tokio runtime is shut down or the task is
/// aborted.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or the bind
/// fails. Both are detected before the task is spawned.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<RunningServer, StartupError> {
    let requested = config.socket_addr()?;
    let listener = TcpListener::bind(requested)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {requested}: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address for {requested}: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve_on(listener, state).await {
            tracing::error!(error = %e, "Gridwall server exited with error");
        }
    });

    tracing::info!(%addr, "Gridwall server spawned on background task");

    Ok(RunningServer { addr, handle })
}
